//! In-process backends
//!
//! Consistent (a write is immediately visible to a subsequent read) and
//! cheap to construct, so orchestrators and the trigger can be exercised
//! without cloud services. `MemoryObjectStore` takes an injected clock so
//! link expiry can be simulated, and announces every write on a broadcast
//! channel the trigger can subscribe to.

use super::{KeyStore, Notifier, ObjectStore, SecretVault};
use async_trait::async_trait;
use chrono::Duration;
use sealpost_core::config::MAX_LINK_TTL_SECONDS;
use sealpost_core::types::{
    KeyMaterial, KeyRole, ObjectCreated, PlaintextSecret, RetrievalLink, StructuredSecret,
};
use sealpost_core::{Clock, ExchangeError, SystemClock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;
use zeroize::Zeroizing;

/// Capacity of the object-created event channel
const EVENT_CAPACITY: usize = 64;

/// Key blobs held in memory
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, Zeroizing<Vec<u8>>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_key(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.keys
            .get_mut()
            .insert(name.into(), Zeroizing::new(bytes.into()));
        self
    }

    pub async fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.keys
            .write()
            .await
            .insert(name.into(), Zeroizing::new(bytes.into()));
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get(&self, name: &str, role: KeyRole) -> Result<KeyMaterial, ExchangeError> {
        let keys = self.keys.read().await;
        let bytes = keys
            .get(name)
            .ok_or_else(|| ExchangeError::key_not_found(name))?;
        Ok(KeyMaterial::new(role, bytes.to_vec()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Secret strings held in memory
#[derive(Default)]
pub struct MemorySecretVault {
    entries: RwLock<HashMap<String, Zeroizing<String>>>,
}

impl MemorySecretVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a raw secret string
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .get_mut()
            .insert(name.into(), Zeroizing::new(value.into()));
        self
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SecretVault for MemorySecretVault {
    async fn get(&self, name: &str) -> Result<PlaintextSecret, ExchangeError> {
        let entries = self.entries.read().await;
        entries
            .get(name)
            .map(|value| PlaintextSecret::new(value.to_string()))
            .ok_or_else(|| ExchangeError::secret_not_found(name))
    }

    async fn create(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(name) {
            return Err(ExchangeError::vault_write(name, "secret already exists"));
        }
        entries.insert(name.to_string(), value.to_json());
        debug!("Created secret {} ({} fields)", name, value.len());
        Ok(())
    }

    async fn put(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError> {
        self.entries
            .write()
            .await
            .insert(name.to_string(), value.to_json());
        debug!("Stored secret {} ({} fields)", name, value.len());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Objects held in memory, with clock-checked retrieval links
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
    links: RwLock<HashMap<String, RetrievalLink>>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<ObjectCreated>,
    next_token: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self::with_clock(bucket, Arc::new(SystemClock))
    }

    pub fn with_clock(bucket: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
            links: RwLock::new(HashMap::new()),
            clock,
            events,
            next_token: AtomicU64::new(1),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Receive an event for every object written after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ObjectCreated> {
        self.events.subscribe()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.objects.read().await.contains_key(name)
    }

    /// Sorted names of all stored objects
    pub async fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.objects.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Download through a previously minted link
    ///
    /// Fails with `StorageReadError` for unknown links and for links whose
    /// expiry instant has been reached on the injected clock.
    pub async fn open_link(&self, url: &str) -> Result<Vec<u8>, ExchangeError> {
        let link = self
            .links
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| ExchangeError::storage_read(url, "unknown retrieval link"))?;

        let now = self.clock.now();
        if !link.is_valid_at(now) {
            return Err(ExchangeError::storage_read(
                &link.object_name,
                format!("retrieval link expired at {}", link.expires_at.to_rfc3339()),
            ));
        }

        self.get(&link.object_name).await
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, name: &str) -> Result<Vec<u8>, ExchangeError> {
        self.objects
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ExchangeError::storage_read(name, "object does not exist"))
    }

    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), ExchangeError> {
        if name.is_empty() {
            return Err(ExchangeError::storage_write(name, "object name is empty"));
        }

        let size = bytes.len() as u64;
        self.objects.write().await.insert(name.to_string(), bytes);
        debug!("Stored {} bytes at memory://{}/{}", size, self.bucket, name);

        let event = ObjectCreated {
            object_name: name.to_string(),
            bucket: Some(self.bucket.clone()),
            size: Some(size),
            event_time: Some(self.clock.now()),
        };
        // No subscribers is fine
        let _ = self.events.send(event);
        Ok(())
    }

    async fn mint_link(&self, name: &str, ttl: Duration) -> Result<RetrievalLink, ExchangeError> {
        if ttl <= Duration::zero() || ttl > Duration::seconds(MAX_LINK_TTL_SECONDS as i64) {
            return Err(ExchangeError::link_mint(
                name,
                format!("ttl of {}s is out of range", ttl.num_seconds()),
            ));
        }

        let minted_at = self.clock.now();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let url = format!(
            "memory://{}/{}?token={}&expires={}",
            self.bucket,
            name,
            token,
            (minted_at + ttl).timestamp()
        );
        let link = RetrievalLink::new(url.clone(), name, minted_at, ttl);
        self.links.write().await.insert(url, link.clone());
        Ok(link)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// A notification recorded by [`MemoryNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: String,
    pub subject: String,
    pub body: String,
}

/// Records published notifications
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), ExchangeError> {
        if channel.is_empty() {
            return Err(ExchangeError::notify(channel, "channel is empty"));
        }
        self.sent.lock().await.push(Notification {
            channel: channel.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
