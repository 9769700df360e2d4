//! S3 backends
//!
//! Supports AWS S3 and S3-compatible storage (MinIO, LocalStack). The
//! object store writes ciphertext objects and mints SigV4 presigned GET
//! links; the key store reads provisioned key blobs from the same bucket.

use super::{KeyStore, ObjectStore};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use chrono::{Duration, Utc};
use sealpost_core::types::{KeyMaterial, KeyRole, RetrievalLink};
use sealpost_core::ExchangeError;
use tracing::{debug, info, warn};

/// Build an S3 client from shared SDK configuration
pub fn client_from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Client {
    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(sdk_config);

    // Configure custom endpoint for S3-compatible storage
    if let Some(endpoint_url) = endpoint {
        s3_config_builder = s3_config_builder
            .endpoint_url(endpoint_url)
            .force_path_style(true); // Required for MinIO and many S3-compatible services
    }

    Client::from_conf(s3_config_builder.build())
}

/// Download an object body, distinguishing a missing key from other failures
async fn fetch(client: &Client, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError> {
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            let detail = DisplayErrorContext(&e).to_string();
            if e.into_service_error().is_no_such_key() {
                FetchError::Missing
            } else {
                FetchError::Other(detail)
            }
        })?;

    let body = resp
        .body
        .collect()
        .await
        .map_err(|e| FetchError::Other(format!("failed to read response body: {}", e)))?;

    Ok(body.into_bytes().to_vec())
}

enum FetchError {
    Missing,
    Other(String),
}

/// Ciphertext objects in one bucket
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, name: &str) -> Result<Vec<u8>, ExchangeError> {
        debug!("Downloading object: s3://{}/{}", self.bucket, name);

        let data = fetch(&self.client, &self.bucket, name)
            .await
            .map_err(|e| match e {
                FetchError::Missing => ExchangeError::storage_read(name, "object does not exist"),
                FetchError::Other(detail) => ExchangeError::storage_read(name, detail),
            })?;

        debug!(
            "Downloaded {} bytes from s3://{}/{}",
            data.len(),
            self.bucket,
            name
        );
        Ok(data)
    }

    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), ExchangeError> {
        let size = bytes.len();
        debug!(
            "Uploading object ({} bytes): s3://{}/{}",
            size, self.bucket, name
        );

        let resp = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(bytes))
            .content_type("text/plain")
            .server_side_encryption(ServerSideEncryption::Aes256) // SSE-S3
            .send()
            .await
            .map_err(|e| ExchangeError::storage_write(name, DisplayErrorContext(&e).to_string()))?;

        info!(
            "Uploaded object to s3://{}/{} (version: {})",
            self.bucket,
            name,
            resp.version_id().unwrap_or("none")
        );
        Ok(())
    }

    async fn mint_link(&self, name: &str, ttl: Duration) -> Result<RetrievalLink, ExchangeError> {
        let expires_in = ttl
            .to_std()
            .map_err(|_| ExchangeError::link_mint(name, "ttl must be positive"))?;
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| ExchangeError::link_mint(name, e.to_string()))?;

        let minted_at = Utc::now();
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .presigned(presigning)
            .await
            .map_err(|e| ExchangeError::link_mint(name, DisplayErrorContext(&e).to_string()))?;

        debug!(
            "Presigned s3://{}/{} for {}s",
            self.bucket,
            name,
            ttl.num_seconds()
        );
        Ok(RetrievalLink::new(request.uri(), name, minted_at, ttl))
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

/// Key blobs stored as objects
#[derive(Clone)]
pub struct S3KeyStore {
    client: Client,
    bucket: String,
}

impl S3KeyStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl KeyStore for S3KeyStore {
    async fn get(&self, name: &str, role: KeyRole) -> Result<KeyMaterial, ExchangeError> {
        debug!("Downloading {} key: s3://{}/{}", role, self.bucket, name);

        match fetch(&self.client, &self.bucket, name).await {
            Ok(bytes) => Ok(KeyMaterial::new(role, bytes)),
            Err(FetchError::Missing) => Err(ExchangeError::key_not_found(name)),
            Err(FetchError::Other(detail)) => {
                warn!("Failed to read key s3://{}/{}: {}", self.bucket, name, detail);
                Err(ExchangeError::key_not_found(name))
            }
        }
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}

impl std::fmt::Debug for S3KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3KeyStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    fn offline_client() -> Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"))
            .build();
        Client::from_conf(config)
    }

    #[tokio::test]
    async fn test_presigned_link_targets_object_and_expires() {
        let store = S3ObjectStore::new(offline_client(), "client-bucket");
        let link = store
            .mint_link("encrypted-secret.txt", Duration::seconds(1800))
            .await
            .unwrap();

        assert!(link.url.contains("encrypted-secret.txt"));
        assert!(link.url.contains("X-Amz-Expires=1800"));
        assert_eq!(link.ttl(), Duration::seconds(1800));
        assert_eq!(link.object_name, "encrypted-secret.txt");
    }

    #[tokio::test]
    async fn test_negative_ttl_is_link_mint_error() {
        let store = S3ObjectStore::new(offline_client(), "client-bucket");
        let err = store
            .mint_link("encrypted-secret.txt", Duration::seconds(-5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), sealpost_core::ErrorKind::LinkMintError);
    }

    #[test]
    fn test_debug_omits_client() {
        let store = S3ObjectStore::new(offline_client(), "client-bucket");
        let debug = format!("{:?}", store);
        assert!(debug.contains("client-bucket"));
        assert!(!debug.contains("client:"));
    }
}
