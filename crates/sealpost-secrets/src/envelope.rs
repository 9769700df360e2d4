//! Asymmetric envelope for one secret value
//!
//! The plaintext is encrypted directly with RSA using OAEP padding over
//! SHA-256 (hash and MGF1). There is no hybrid layer and no chunking, so a
//! plaintext must fit in one RSA block:
//!
//! ```text
//! max_len = modulus_bytes - 2 * 32 - 2      (190 bytes for RSA-2048)
//! ```
//!
//! Ciphertext is stored as standard padded base64 text.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sealpost_core::types::{Ciphertext, KeyMaterial, KeyRole, PlaintextSecret};
use sealpost_core::ExchangeError;
use sha2::Sha256;
use zeroize::Zeroize;

/// Output size of the OAEP hash (SHA-256)
const OAEP_HASH_LEN: usize = 32;

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

/// Encrypts plaintexts under a recipient's public key
pub struct SecretSealer {
    key: RsaPublicKey,
}

impl SecretSealer {
    /// Parse a public key blob (SPKI or PKCS#1, PEM or DER)
    pub fn from_key(material: &KeyMaterial) -> Result<Self, ExchangeError> {
        if material.role() != KeyRole::Public {
            return Err(ExchangeError::encryption(format!(
                "expected a public key, got a {} key",
                material.role()
            )));
        }
        let key = parse_public_key(material.as_bytes()).map_err(ExchangeError::encryption)?;
        Ok(Self { key })
    }

    /// Largest plaintext, in bytes, this key can seal
    pub fn max_plaintext_len(&self) -> usize {
        self.key.size().saturating_sub(2 * OAEP_HASH_LEN + 2)
    }

    /// Modulus size in bits
    pub fn key_bits(&self) -> usize {
        self.key.size() * 8
    }

    /// Encrypt the raw UTF-8 bytes of a plaintext
    pub fn seal(&self, plaintext: &PlaintextSecret) -> Result<Ciphertext, ExchangeError> {
        let max = self.max_plaintext_len();
        if plaintext.len() > max {
            return Err(ExchangeError::encryption(format!(
                "plaintext of {} bytes exceeds the {}-byte limit of a {}-bit key",
                plaintext.len(),
                max,
                self.key_bits()
            )));
        }

        let bytes = self
            .key
            .encrypt(&mut OsRng, oaep(), plaintext.as_bytes())
            .map_err(|e| ExchangeError::encryption(e.to_string()))?;

        Ok(Ciphertext::new(bytes))
    }
}

impl std::fmt::Debug for SecretSealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSealer")
            .field("key_bits", &self.key_bits())
            .finish()
    }
}

/// Decrypts ciphertexts with the recipient's private key
pub struct SecretOpener {
    key: RsaPrivateKey,
}

impl SecretOpener {
    /// Parse a private key blob (PKCS#8 or PKCS#1, PEM or DER)
    pub fn from_key(material: &KeyMaterial) -> Result<Self, ExchangeError> {
        if material.role() != KeyRole::Private {
            return Err(ExchangeError::decryption(format!(
                "expected a private key, got a {} key",
                material.role()
            )));
        }
        let key = parse_private_key(material.as_bytes()).map_err(ExchangeError::decryption)?;
        Ok(Self { key })
    }

    /// Decrypt and validate the plaintext as UTF-8
    pub fn open(&self, ciphertext: &Ciphertext) -> Result<PlaintextSecret, ExchangeError> {
        let bytes = self
            .key
            .decrypt(oaep(), ciphertext.as_bytes())
            .map_err(|e| ExchangeError::decryption(e.to_string()))?;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(PlaintextSecret::new(text)),
            Err(e) => {
                let mut raw = e.into_bytes();
                raw.zeroize();
                Err(ExchangeError::decryption("plaintext is not valid UTF-8"))
            }
        }
    }
}

impl std::fmt::Debug for SecretOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretOpener")
            .field("key_bits", &(self.key.size() * 8))
            .finish_non_exhaustive()
    }
}

/// Encode a ciphertext for storage
pub fn armor(ciphertext: &Ciphertext) -> Vec<u8> {
    BASE64.encode(ciphertext.as_bytes()).into_bytes()
}

/// Decode a stored ciphertext object
pub fn dearmor(object_name: &str, stored: &[u8]) -> Result<Ciphertext, ExchangeError> {
    let text = std::str::from_utf8(stored)
        .map_err(|_| ExchangeError::decode(object_name, "object is not base64 text"))?;

    let bytes = BASE64
        .decode(text.trim())
        .map_err(|e| ExchangeError::decode(object_name, e.to_string()))?;

    if bytes.is_empty() {
        return Err(ExchangeError::decode(object_name, "object is empty"));
    }

    Ok(Ciphertext::new(bytes))
}

fn pem_text(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes)
        .ok()
        .map(str::trim)
        .filter(|text| text.starts_with("-----BEGIN"))
}

fn parse_public_key(bytes: &[u8]) -> Result<RsaPublicKey, String> {
    if let Some(pem) = pem_text(bytes) {
        return RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| format!("malformed public key PEM: {}", e));
    }

    RsaPublicKey::from_public_key_der(bytes)
        .or_else(|_| RsaPublicKey::from_pkcs1_der(bytes))
        .map_err(|e| format!("malformed public key: {}", e))
}

fn parse_private_key(bytes: &[u8]) -> Result<RsaPrivateKey, String> {
    if let Some(pem) = pem_text(bytes) {
        return RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| format!("malformed private key PEM: {}", e));
    }

    RsaPrivateKey::from_pkcs8_der(bytes)
        .or_else(|_| RsaPrivateKey::from_pkcs1_der(bytes))
        .map_err(|e| format!("malformed private key: {}", e))
}
