//! Error types for sealpost-core

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using sealpost-core's configuration Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Failure taxonomy of a secret exchange.
///
/// Every accessor and both orchestrators report failures with this type.
/// Messages never carry secret values, key bytes or ciphertext.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Key not found: {name}")]
    KeyNotFound { name: String },

    #[error("Secret not found: {name}")]
    SecretNotFound { name: String },

    #[error("Encryption failed: {message}")]
    Encryption { message: String },

    #[error("Decryption failed: {message}")]
    Decryption { message: String },

    #[error("Failed to decode object {name}: {message}")]
    Decode { name: String, message: String },

    #[error("Failed to read object {name}: {message}")]
    StorageRead { name: String, message: String },

    #[error("Failed to write object {name}: {message}")]
    StorageWrite { name: String, message: String },

    #[error("Failed to mint retrieval link for {name}: {message}")]
    LinkMint { name: String, message: String },

    #[error("Failed to notify {channel}: {message}")]
    Notify { channel: String, message: String },

    #[error("Failed to write secret {name}: {message}")]
    VaultWrite { name: String, message: String },
}

impl ExchangeError {
    pub fn key_not_found(name: impl Into<String>) -> Self {
        Self::KeyNotFound { name: name.into() }
    }

    pub fn secret_not_found(name: impl Into<String>) -> Self {
        Self::SecretNotFound { name: name.into() }
    }

    pub fn encryption(message: impl Into<String>) -> Self {
        Self::Encryption {
            message: message.into(),
        }
    }

    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    pub fn decode(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn storage_read(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageRead {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn storage_write(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageWrite {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn link_mint(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LinkMint {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn notify(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn vault_write(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VaultWrite {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The taxonomy entry of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::SecretNotFound { .. } => ErrorKind::SecretNotFound,
            Self::Encryption { .. } => ErrorKind::EncryptionError,
            Self::Decryption { .. } => ErrorKind::DecryptionError,
            Self::Decode { .. } => ErrorKind::DecodeError,
            Self::StorageRead { .. } => ErrorKind::StorageReadError,
            Self::StorageWrite { .. } => ErrorKind::StorageWriteError,
            Self::LinkMint { .. } => ErrorKind::LinkMintError,
            Self::Notify { .. } => ErrorKind::NotifyError,
            Self::VaultWrite { .. } => ErrorKind::VaultWriteError,
        }
    }
}

/// Serializable discriminant of [`ExchangeError`], used in invocation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    KeyNotFound,
    SecretNotFound,
    EncryptionError,
    DecryptionError,
    DecodeError,
    StorageReadError,
    StorageWriteError,
    LinkMintError,
    NotifyError,
    VaultWriteError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::KeyNotFound => "KeyNotFound",
            ErrorKind::SecretNotFound => "SecretNotFound",
            ErrorKind::EncryptionError => "EncryptionError",
            ErrorKind::DecryptionError => "DecryptionError",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::StorageReadError => "StorageReadError",
            ErrorKind::StorageWriteError => "StorageWriteError",
            ErrorKind::LinkMintError => "LinkMintError",
            ErrorKind::NotifyError => "NotifyError",
            ErrorKind::VaultWriteError => "VaultWriteError",
        };
        f.write_str(name)
    }
}
