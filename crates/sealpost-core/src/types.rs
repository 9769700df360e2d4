//! Data model of a secret exchange

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Role of a key blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    Public,
    Private,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Public => write!(f, "public"),
            KeyRole::Private => write!(f, "private"),
        }
    }
}

/// Opaque key blob tagged with its role
///
/// Bytes are zeroed on drop regardless of role.
#[derive(Clone)]
pub struct KeyMaterial {
    role: KeyRole,
    bytes: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    pub fn new(role: KeyRole, bytes: Vec<u8>) -> Self {
        Self {
            role,
            bytes: Zeroizing::new(bytes),
        }
    }

    pub fn public(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(KeyRole::Public, bytes.into())
    }

    pub fn private(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(KeyRole::Private, bytes.into())
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({}, {} bytes)", self.role, self.bytes.len())
    }
}

/// A UTF-8 secret value that is zeroed on drop and never printed
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PlaintextSecret {
    inner: String,
}

impl PlaintextSecret {
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Get the string value (use with caution)
    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for PlaintextSecret {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for PlaintextSecret {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl fmt::Debug for PlaintextSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlaintextSecret([REDACTED {} bytes])", self.len())
    }
}

impl fmt::Display for PlaintextSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Raw output of asymmetric encryption
#[derive(Clone, PartialEq, Eq)]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({} bytes)", self.0.len())
    }
}

/// Time-limited, read-only download link for one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalLink {
    pub url: String,
    pub object_name: String,
    pub minted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RetrievalLink {
    pub fn new(
        url: impl Into<String>,
        object_name: impl Into<String>,
        minted_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            object_name: object_name.into(),
            minted_at,
            expires_at: minted_at + ttl,
        }
    }

    /// A link is usable strictly before its expiry instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn ttl(&self) -> Duration {
        self.expires_at - self.minted_at
    }
}

/// Structured vault value: named fields holding secret strings
///
/// Serialized as a flat JSON object, e.g. `{"appsecret":"..."}`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct StructuredSecret {
    fields: BTreeMap<String, PlaintextSecret>,
}

impl StructuredSecret {
    /// A value with exactly one field
    pub fn single(field: impl Into<String>, value: PlaintextSecret) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), value);
        Self { fields }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: PlaintextSecret) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&PlaintextSecret> {
        self.fields.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlaintextSecret)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as a JSON object string
    pub fn to_json(&self) -> Zeroizing<String> {
        let borrowed: BTreeMap<&str, &str> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.expose()))
            .collect();
        // A map of strings always serializes
        Zeroizing::new(serde_json::to_string(&borrowed).unwrap_or_default())
    }

    /// Parse a flat JSON object of string fields
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        let fields = raw
            .into_iter()
            .map(|(k, v)| (k, PlaintextSecret::new(v)))
            .collect();
        Ok(Self { fields })
    }
}

impl fmt::Debug for StructuredSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredSecret")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Notification that a new object appeared in the object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCreated {
    pub object_name: String,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
}

impl ObjectCreated {
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            bucket: None,
            size: None,
            event_time: None,
        }
    }
}
