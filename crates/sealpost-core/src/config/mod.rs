//! Configuration for sealpost deployments

mod loader;
mod types;

pub use loader::SealpostConfig;
pub use types::{
    BackendsConfig, ExchangeSettings, KeyStoreBackend, NotifierBackend, ObjectStoreBackend,
    SealpostConfigFile, VaultBackend, VaultWriteMode, DEFAULT_LINK_TTL_SECONDS,
    MAX_LINK_TTL_SECONDS,
};
