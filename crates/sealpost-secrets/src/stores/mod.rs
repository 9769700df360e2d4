//! Accessor traits for the services an exchange talks to
//!
//! Each accessor is a narrow capability: get/put by exact name, plus link
//! minting for object storage. Names are flat strings; there is no
//! directory semantics and no fuzzy matching.

pub mod file;
pub mod hashicorp;
pub mod log;
pub mod memory;
pub mod s3;
pub mod secrets_manager;
pub mod sns;
pub mod webhook;

use async_trait::async_trait;
use chrono::Duration;
use sealpost_core::types::{KeyMaterial, KeyRole, PlaintextSecret, RetrievalLink, StructuredSecret};
use sealpost_core::ExchangeError;

/// Durable storage of key blobs
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Fetch a key blob and tag it with the role the caller expects.
    /// Fails with `KeyNotFound`.
    async fn get(&self, name: &str, role: KeyRole) -> Result<KeyMaterial, ExchangeError>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}

/// Secret-management backend
#[async_trait]
pub trait SecretVault: Send + Sync {
    /// Read a secret string. Fails with `SecretNotFound`.
    async fn get(&self, name: &str) -> Result<PlaintextSecret, ExchangeError>;

    /// Create a new entry. Fails with `VaultWriteError` if the name exists.
    async fn create(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError>;

    /// Update an entry, creating it if absent. Fails with `VaultWriteError`.
    async fn put(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}

/// Named binary objects with time-limited download links
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fails with `StorageReadError`.
    async fn get(&self, name: &str) -> Result<Vec<u8>, ExchangeError>;

    /// Create or overwrite an object. Fails with `StorageWriteError`.
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), ExchangeError>;

    /// Mint a read-only link valid for `ttl`. Fails with `LinkMintError`.
    async fn mint_link(&self, name: &str, ttl: Duration) -> Result<RetrievalLink, ExchangeError>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}

/// One-way message delivery to a subscribed recipient
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fails with `NotifyError`.
    async fn publish(&self, channel: &str, subject: &str, body: &str)
        -> Result<(), ExchangeError>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}

pub use file::FileKeyStore;
pub use hashicorp::{HashiCorpVault, HashiCorpVaultConfig};
pub use log::LogNotifier;
pub use memory::{
    MemoryKeyStore, MemoryNotifier, MemoryObjectStore, MemorySecretVault, Notification,
};
pub use s3::{S3KeyStore, S3ObjectStore};
pub use secrets_manager::AwsSecretVault;
pub use sns::SnsNotifier;
pub use webhook::WebhookNotifier;
