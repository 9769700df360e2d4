//! HashiCorp Vault KV v2 backend
//!
//! Reads take one field of the stored map. Create-only writes use
//! check-and-set version 0 so a second write to the same path is rejected
//! by the server.

use super::SecretVault;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sealpost_core::types::{PlaintextSecret, StructuredSecret};
use sealpost_core::ExchangeError;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use vaultrs::api::kv2::requests::SetSecretRequestOptions;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct HashiCorpVaultConfig {
    pub address: String,
    pub token: Zeroizing<String>,
    pub mount: String,
    pub namespace: Option<String>,
    /// Field returned by `get` when the stored map has several
    pub read_field: String,
    pub timeout: Duration,
}

impl HashiCorpVaultConfig {
    /// Read the token from the named environment variable
    pub fn from_env(
        address: impl Into<String>,
        mount: impl Into<String>,
        token_env: &str,
        namespace: Option<String>,
        read_field: impl Into<String>,
    ) -> Result<Self> {
        let token = std::env::var(token_env)
            .with_context(|| format!("{} environment variable not set", token_env))?;

        Ok(Self {
            address: address.into(),
            token: Zeroizing::new(token),
            mount: mount.into(),
            namespace,
            read_field: read_field.into(),
            timeout: Duration::from_secs(30),
        })
    }
}

impl std::fmt::Debug for HashiCorpVaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashiCorpVaultConfig")
            .field("address", &self.address)
            .field("token", &"[REDACTED]")
            .field("mount", &self.mount)
            .field("namespace", &self.namespace)
            .field("read_field", &self.read_field)
            .finish()
    }
}

pub struct HashiCorpVault {
    config: Arc<HashiCorpVaultConfig>,
    client: VaultClient,
}

impl HashiCorpVault {
    pub fn new(config: HashiCorpVaultConfig) -> Result<Self> {
        let mut settings = VaultClientSettingsBuilder::default();
        settings.address(&config.address);
        settings.token(config.token.as_str());
        settings.timeout(Some(config.timeout));

        if let Some(ns) = &config.namespace {
            settings.namespace(Some(ns.clone()));
        }

        let client = VaultClient::new(
            settings
                .build()
                .context("Invalid HashiCorp Vault client settings")?,
        )
        .context("Failed to create HashiCorp Vault client")?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &HashiCorpVaultConfig {
        &self.config
    }

    fn payload(value: &StructuredSecret) -> BTreeMap<&str, &str> {
        value.iter().map(|(k, v)| (k, v.expose())).collect()
    }
}

/// Pick the configured field, or the only field when there is exactly one
fn select_field(
    name: &str,
    read_field: &str,
    mut data: BTreeMap<String, String>,
) -> Result<PlaintextSecret, ExchangeError> {
    if let Some(value) = data.remove(read_field) {
        return Ok(PlaintextSecret::new(value));
    }
    if data.len() == 1 {
        if let Some((_, value)) = data.pop_first() {
            return Ok(PlaintextSecret::new(value));
        }
    }
    warn!(
        "Secret {} has no field '{}' (fields: {:?})",
        name,
        read_field,
        data.keys().collect::<Vec<_>>()
    );
    Err(ExchangeError::secret_not_found(name))
}

fn api_code(err: &ClientError) -> Option<u16> {
    match err {
        ClientError::APIError { code, .. } => Some(*code),
        _ => None,
    }
}

#[async_trait]
impl SecretVault for HashiCorpVault {
    async fn get(&self, name: &str) -> Result<PlaintextSecret, ExchangeError> {
        match kv2::read::<BTreeMap<String, String>>(&self.client, &self.config.mount, name).await {
            Ok(data) => {
                debug!("Read secret from Vault: {}/{}", self.config.mount, name);
                select_field(name, &self.config.read_field, data)
            }
            Err(e) => {
                if api_code(&e) != Some(404) {
                    warn!("Vault read of {}/{} failed: {}", self.config.mount, name, e);
                }
                Err(ExchangeError::secret_not_found(name))
            }
        }
    }

    async fn create(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError> {
        let payload = Self::payload(value);
        kv2::set_with_options(
            &self.client,
            &self.config.mount,
            name,
            &payload,
            SetSecretRequestOptions { cas: 0 },
        )
        .await
        .map_err(|e| match api_code(&e) {
            Some(400) => {
                ExchangeError::vault_write(name, "secret already exists (check-and-set rejected)")
            }
            _ => ExchangeError::vault_write(name, e.to_string()),
        })?;

        debug!("Created secret in Vault: {}/{}", self.config.mount, name);
        Ok(())
    }

    async fn put(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError> {
        let payload = Self::payload(value);
        kv2::set(&self.client, &self.config.mount, name, &payload)
            .await
            .map_err(|e| ExchangeError::vault_write(name, e.to_string()))?;

        debug!("Wrote secret in Vault: {}/{}", self.config.mount, name);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "hashicorp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealpost_core::ErrorKind;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_select_configured_field() {
        let data = map(&[("value", "abc"), ("other", "x")]);
        assert_eq!(select_field("s", "value", data).unwrap().expose(), "abc");
    }

    #[test]
    fn test_select_sole_field() {
        let data = map(&[("appsecret", "only")]);
        assert_eq!(select_field("s", "value", data).unwrap().expose(), "only");
    }

    #[test]
    fn test_select_ambiguous_is_not_found() {
        let data = map(&[("a", "1"), ("b", "2")]);
        let err = select_field("s", "value", data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SecretNotFound);
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = HashiCorpVaultConfig {
            address: "http://127.0.0.1:8200".into(),
            token: Zeroizing::new("hvs.supersecret".into()),
            mount: "secret".into(),
            namespace: None,
            read_field: "value".into(),
            timeout: Duration::from_secs(30),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hvs.supersecret"));
        assert!(debug.contains("127.0.0.1:8200"));
    }

    #[test]
    fn test_api_code() {
        let err = ClientError::APIError {
            code: 404,
            errors: vec![],
        };
        assert_eq!(api_code(&err), Some(404));
    }
}
