//! Secret hand-off primitives for sealpost
//!
//! This crate provides:
//! - **Envelope**: RSA-OAEP (SHA-256) sealing of a plaintext under the
//!   recipient's public key, and opening with the private key
//! - **Accessors**: `KeyStore`, `SecretVault`, `ObjectStore` and `Notifier`
//!   traits with in-memory, file, AWS (S3, Secrets Manager, SNS),
//!   HashiCorp Vault and webhook backends
//! - **Security**: audit logging and error sanitization (never logs secret values)

pub mod aws;
pub mod envelope;
pub mod security;
pub mod stores;

pub use envelope::{armor, dearmor, SecretOpener, SecretSealer};
pub use security::{redact_exchange_message, sanitize_error, AuditLog};
pub use stores::{KeyStore, Notifier, ObjectStore, SecretVault};
