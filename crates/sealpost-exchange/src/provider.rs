//! Lazily-built accessor backends
//!
//! Client handles are expensive to construct (credential resolution, TLS
//! setup), so they are built on first use and then shared for the life of
//! the process. Orchestrators borrow `&Services`; tests hand in their own.

use anyhow::{anyhow, Context, Result};
use sealpost_core::config::{
    BackendsConfig, KeyStoreBackend, NotifierBackend, ObjectStoreBackend, VaultBackend,
};
use sealpost_secrets::aws::{load_sdk_config, SdkConfig};
use sealpost_secrets::stores::{
    s3, AwsSecretVault, FileKeyStore, HashiCorpVault, HashiCorpVaultConfig, LogNotifier,
    MemoryKeyStore, MemoryNotifier, MemoryObjectStore, MemorySecretVault, S3KeyStore,
    S3ObjectStore, SnsNotifier, WebhookNotifier,
};
use sealpost_secrets::{KeyStore, Notifier, ObjectStore, SecretVault};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Bucket name used by the in-memory object store when none is configured
const MEMORY_BUCKET: &str = "sealpost";

/// The four accessors an exchange talks to
#[derive(Clone)]
pub struct Services {
    pub keys: Arc<dyn KeyStore>,
    pub vault: Arc<dyn SecretVault>,
    pub objects: Arc<dyn ObjectStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    pub fn new(
        keys: Arc<dyn KeyStore>,
        vault: Arc<dyn SecretVault>,
        objects: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            keys,
            vault,
            objects,
            notifier,
        }
    }

    /// Build every accessor named in the backends section
    pub async fn from_config(backends: &BackendsConfig) -> Result<Self> {
        let sdk = if uses_aws(backends) {
            Some(load_sdk_config(&backends.region, backends.endpoint.as_deref()).await)
        } else {
            None
        };
        let endpoint = backends.endpoint.as_deref();

        let keys: Arc<dyn KeyStore> = match &backends.keys {
            KeyStoreBackend::Memory => Arc::new(MemoryKeyStore::new()),
            KeyStoreBackend::File { dir } => Arc::new(FileKeyStore::new(dir.as_std_path())),
            KeyStoreBackend::S3 => Arc::new(S3KeyStore::new(
                s3::client_from_sdk_config(aws(&sdk)?, endpoint),
                bucket(backends)?,
            )),
        };

        let vault: Arc<dyn SecretVault> = match &backends.vault {
            VaultBackend::Memory => Arc::new(MemorySecretVault::new()),
            VaultBackend::AwsSecretsManager => {
                Arc::new(AwsSecretVault::from_sdk_config(aws(&sdk)?, endpoint))
            }
            VaultBackend::Hashicorp {
                address,
                mount,
                token_env,
                namespace,
                read_field,
            } => {
                let config = HashiCorpVaultConfig::from_env(
                    address.clone(),
                    mount.clone(),
                    token_env,
                    namespace.clone(),
                    read_field.clone(),
                )?;
                Arc::new(HashiCorpVault::new(config)?)
            }
        };

        let objects: Arc<dyn ObjectStore> = match &backends.objects {
            ObjectStoreBackend::Memory => Arc::new(MemoryObjectStore::new(
                backends.bucket.as_deref().unwrap_or(MEMORY_BUCKET),
            )),
            ObjectStoreBackend::S3 => Arc::new(S3ObjectStore::new(
                s3::client_from_sdk_config(aws(&sdk)?, endpoint),
                bucket(backends)?,
            )),
        };

        let notifier: Arc<dyn Notifier> = match &backends.notifier {
            NotifierBackend::Memory => Arc::new(MemoryNotifier::new()),
            NotifierBackend::Log => Arc::new(LogNotifier::new()),
            NotifierBackend::Sns => Arc::new(SnsNotifier::from_sdk_config(aws(&sdk)?, endpoint)),
            NotifierBackend::Webhook { url } => Arc::new(
                WebhookNotifier::new(url.clone()).context("Failed to build webhook client")?,
            ),
        };

        info!(
            keys = keys.backend(),
            vault = vault.backend(),
            objects = objects.backend(),
            notifier = notifier.backend(),
            "Initialized exchange services"
        );

        Ok(Self::new(keys, vault, objects, notifier))
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("keys", &self.keys.backend())
            .field("vault", &self.vault.backend())
            .field("objects", &self.objects.backend())
            .field("notifier", &self.notifier.backend())
            .finish()
    }
}

fn uses_aws(backends: &BackendsConfig) -> bool {
    matches!(backends.keys, KeyStoreBackend::S3)
        || matches!(backends.vault, VaultBackend::AwsSecretsManager)
        || matches!(backends.objects, ObjectStoreBackend::S3)
        || matches!(backends.notifier, NotifierBackend::Sns)
}

fn aws(sdk: &Option<SdkConfig>) -> Result<&SdkConfig> {
    sdk.as_ref()
        .ok_or_else(|| anyhow!("AWS configuration was not loaded"))
}

fn bucket(backends: &BackendsConfig) -> Result<String> {
    backends
        .bucket
        .clone()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| anyhow!("backends.bucket is required for the s3 backends (or set BUCKET_NAME)"))
}

/// Builds [`Services`] on first request and hands out the same instance
/// afterwards
pub struct ServiceProvider {
    backends: BackendsConfig,
    services: OnceCell<Services>,
}

impl ServiceProvider {
    pub fn new(backends: BackendsConfig) -> Self {
        Self {
            backends,
            services: OnceCell::new(),
        }
    }

    /// A provider that is already initialized with the given services
    pub fn with_services(services: Services) -> Self {
        Self {
            backends: BackendsConfig::default(),
            services: OnceCell::new_with(Some(services)),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.services.initialized()
    }

    pub async fn get(&self) -> Result<&Services> {
        self.services
            .get_or_try_init(|| async {
                debug!("Building exchange services");
                Services::from_config(&self.backends).await
            })
            .await
    }
}
