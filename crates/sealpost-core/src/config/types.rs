//! Configuration types for sealpost.yaml

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Retrieval links expire 30 minutes after minting unless configured otherwise
pub const DEFAULT_LINK_TTL_SECONDS: u64 = 1800;

/// Upper bound for presigned links (7 days)
pub const MAX_LINK_TTL_SECONDS: u64 = 604_800;

/// Root sealpost.yaml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealpostConfigFile {
    /// Configuration schema version
    #[serde(default = "default_version")]
    pub version: String,

    /// Names and policies of the exchange
    #[serde(default)]
    pub exchange: ExchangeSettings,

    /// Which services back each accessor
    #[serde(default)]
    pub backends: BackendsConfig,
}

fn default_version() -> String {
    "1".to_string()
}

impl Default for SealpostConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            exchange: ExchangeSettings::default(),
            backends: BackendsConfig::default(),
        }
    }
}

/// Names of keys, objects, vault entries and the notification channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSettings {
    /// Vault entry holding the plaintext to send (sender side)
    #[serde(default)]
    pub source_secret_name: String,

    /// KeyStore name of the recipient's public key (sender side)
    #[serde(default)]
    pub public_key_name: String,

    /// KeyStore name of the private key (receiver side)
    #[serde(default)]
    pub private_key_name: String,

    /// Object holding the base64 ciphertext
    #[serde(default = "default_source_object_name")]
    pub source_object_name: String,

    /// Vault entry the receiver writes (receiver side)
    #[serde(default)]
    pub vault_secret_name: String,

    /// Field of the structured vault value holding the secret
    #[serde(default = "default_vault_secret_field")]
    pub vault_secret_field: String,

    /// Create-only or update-or-create
    #[serde(default)]
    pub vault_write_mode: VaultWriteMode,

    /// Notification channel (topic ARN, webhook label, ...)
    #[serde(default)]
    pub notify_channel: String,

    /// Subject line of the notification
    #[serde(default = "default_notify_subject")]
    pub notify_subject: String,

    /// Validity of the retrieval link
    #[serde(default = "default_link_ttl_seconds")]
    pub link_ttl_seconds: u64,

    /// Objects whose name ends with this suffix fire the trigger
    #[serde(default = "default_trigger_suffix")]
    pub trigger_suffix: String,
}

fn default_source_object_name() -> String {
    "encrypted-secret.txt".to_string()
}

fn default_vault_secret_field() -> String {
    "appsecret".to_string()
}

fn default_notify_subject() -> String {
    "Encrypted client credentials".to_string()
}

fn default_link_ttl_seconds() -> u64 {
    DEFAULT_LINK_TTL_SECONDS
}

fn default_trigger_suffix() -> String {
    ".txt".to_string()
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            source_secret_name: String::new(),
            public_key_name: String::new(),
            private_key_name: String::new(),
            source_object_name: default_source_object_name(),
            vault_secret_name: String::new(),
            vault_secret_field: default_vault_secret_field(),
            vault_write_mode: VaultWriteMode::default(),
            notify_channel: String::new(),
            notify_subject: default_notify_subject(),
            link_ttl_seconds: default_link_ttl_seconds(),
            trigger_suffix: default_trigger_suffix(),
        }
    }
}

impl ExchangeSettings {
    /// Link validity as a chrono duration
    pub fn link_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.link_ttl_seconds as i64)
    }
}

/// How the receiver writes into the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VaultWriteMode {
    /// Fail if the entry already exists
    #[default]
    Create,
    /// Overwrite an existing entry, creating it if absent
    Upsert,
}

impl fmt::Display for VaultWriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultWriteMode::Create => write!(f, "create"),
            VaultWriteMode::Upsert => write!(f, "upsert"),
        }
    }
}

impl std::str::FromStr for VaultWriteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(VaultWriteMode::Create),
            "upsert" | "update" => Ok(VaultWriteMode::Upsert),
            other => Err(format!(
                "unknown vault write mode '{}' (expected create or upsert)",
                other
            )),
        }
    }
}

/// Backend selection and shared cloud settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsConfig {
    /// Cloud region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for S3-compatible or local emulators
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bucket holding ciphertext objects (and keys for the s3 key store)
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub keys: KeyStoreBackend,

    #[serde(default)]
    pub vault: VaultBackend,

    #[serde(default)]
    pub objects: ObjectStoreBackend,

    #[serde(default)]
    pub notifier: NotifierBackend,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            bucket: None,
            keys: KeyStoreBackend::default(),
            vault: VaultBackend::default(),
            objects: ObjectStoreBackend::default(),
            notifier: NotifierBackend::default(),
        }
    }
}

/// Where key blobs are read from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum KeyStoreBackend {
    /// Process-local map (tests)
    Memory,
    /// Directory of PEM/DER files
    File { dir: Utf8PathBuf },
    /// Objects in the exchange bucket
    #[default]
    S3,
}

/// Secret-management backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VaultBackend {
    Memory,
    #[default]
    AwsSecretsManager,
    Hashicorp {
        address: String,
        #[serde(default = "default_vault_mount")]
        mount: String,
        #[serde(default = "default_vault_token_env")]
        token_env: String,
        #[serde(default)]
        namespace: Option<String>,
        /// Field read when the sender fetches a plaintext from a KV entry
        #[serde(default = "default_vault_read_field")]
        read_field: String,
    },
}

fn default_vault_mount() -> String {
    "secret".to_string()
}

fn default_vault_token_env() -> String {
    "VAULT_TOKEN".to_string()
}

fn default_vault_read_field() -> String {
    "value".to_string()
}

/// Object storage backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectStoreBackend {
    Memory,
    #[default]
    S3,
}

/// Notification transport
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NotifierBackend {
    Memory,
    /// Emit the notification through tracing only
    Log,
    #[default]
    Sns,
    Webhook {
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SealpostConfigFile::default();
        assert_eq!(config.exchange.link_ttl_seconds, 1800);
        assert_eq!(config.exchange.source_object_name, "encrypted-secret.txt");
        assert_eq!(config.exchange.vault_secret_field, "appsecret");
        assert_eq!(config.exchange.vault_write_mode, VaultWriteMode::Create);
        assert_eq!(config.backends.keys, KeyStoreBackend::S3);
        assert_eq!(config.backends.notifier, NotifierBackend::Sns);
    }

    #[test]
    fn test_backend_tags_parse() {
        let yaml = r#"
region: eu-west-1
bucket: exchange-bucket
keys:
  type: file
  dir: /etc/sealpost/keys
vault:
  type: hashicorp
  address: https://vault.internal:8200
objects:
  type: memory
notifier:
  type: webhook
  url: https://hooks.example.invalid/notify
"#;
        let backends: BackendsConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            backends.keys,
            KeyStoreBackend::File {
                dir: Utf8PathBuf::from("/etc/sealpost/keys")
            }
        );
        match backends.vault {
            VaultBackend::Hashicorp {
                mount, token_env, ..
            } => {
                assert_eq!(mount, "secret");
                assert_eq!(token_env, "VAULT_TOKEN");
            }
            other => panic!("unexpected vault backend: {:?}", other),
        }
        assert_eq!(backends.objects, ObjectStoreBackend::Memory);
    }

    #[test]
    fn test_vault_write_mode_parse() {
        assert_eq!("create".parse::<VaultWriteMode>(), Ok(VaultWriteMode::Create));
        assert_eq!("Upsert".parse::<VaultWriteMode>(), Ok(VaultWriteMode::Upsert));
        assert!("replace".parse::<VaultWriteMode>().is_err());

        let json = serde_json::to_string(&VaultWriteMode::Upsert).unwrap();
        assert_eq!(json, "\"upsert\"");
    }
}
