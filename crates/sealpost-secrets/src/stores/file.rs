//! Directory-backed key store
//!
//! Keys are provisioned externally as files in one directory. Key names
//! are plain file names; anything that could escape the directory is
//! rejected.

use super::KeyStore;
use async_trait::async_trait;
use sealpost_core::types::{KeyMaterial, KeyRole};
use sealpost_core::ExchangeError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a key name to a path inside the key directory
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let is_plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\')
            && !name.contains('\0');

        is_plain.then(|| self.dir.join(name))
    }

    #[cfg(unix)]
    async fn warn_if_exposed(path: &Path, role: KeyRole) {
        use std::os::unix::fs::PermissionsExt;

        if role != KeyRole::Private {
            return;
        }
        if let Ok(meta) = tokio::fs::metadata(path).await {
            let mode = meta.permissions().mode();
            if mode & 0o077 != 0 {
                warn!(
                    "Private key {} is accessible by group or others (mode {:o})",
                    path.display(),
                    mode & 0o777
                );
            }
        }
    }

    #[cfg(not(unix))]
    async fn warn_if_exposed(_path: &Path, _role: KeyRole) {}
}

#[async_trait]
impl KeyStore for FileKeyStore {
    async fn get(&self, name: &str, role: KeyRole) -> Result<KeyMaterial, ExchangeError> {
        let path = self.resolve(name).ok_or_else(|| {
            warn!("Rejected key name outside the key directory: {:?}", name);
            ExchangeError::key_not_found(name)
        })?;

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read key file {}: {}", path.display(), e);
            }
            ExchangeError::key_not_found(name)
        })?;

        Self::warn_if_exposed(&path, role).await;
        debug!("Read {} key {} ({} bytes)", role, name, bytes.len());
        Ok(KeyMaterial::new(role, bytes))
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealpost_core::ErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_key_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("client-one-public.pem"), "PUBLIC").unwrap();

        let store = FileKeyStore::new(dir.path());
        let key = store
            .get("client-one-public.pem", KeyRole::Public)
            .await
            .unwrap();
        assert_eq!(key.as_bytes(), b"PUBLIC");
        assert_eq!(key.role(), KeyRole::Public);
        assert_eq!(store.backend(), "file");
    }

    #[tokio::test]
    async fn test_missing_key_is_key_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(dir.path());
        let err = store.get("absent.pem", KeyRole::Private).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("keys");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(dir.path().join("outside.pem"), "OUTSIDE").unwrap();

        let store = FileKeyStore::new(&inner);
        for name in ["../outside.pem", "..", "", "sub/key.pem", "a\\b"] {
            let err = store.get(name, KeyRole::Public).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::KeyNotFound, "name {:?}", name);
        }
    }

    #[test]
    fn test_resolve_keeps_dotted_names() {
        let store = FileKeyStore::new("/etc/sealpost/keys");
        assert_eq!(
            store.resolve("client.one.pem"),
            Some(PathBuf::from("/etc/sealpost/keys/client.one.pem"))
        );
        assert_eq!(store.resolve(".."), None);
    }
}
