//! Shared AWS SDK configuration
//!
//! One `SdkConfig` is loaded per process and shared by the S3, Secrets
//! Manager and SNS clients.

use aws_config::BehaviorVersion;
pub use aws_config::SdkConfig;
use aws_sdk_s3::config::Region;
use tracing::debug;

/// Load SDK configuration for a region, optionally pointing every service
/// at a custom endpoint (LocalStack, MinIO, ...)
pub async fn load_sdk_config(region: &str, endpoint: Option<&str>) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    if let Some(endpoint_url) = endpoint {
        debug!("Using custom AWS endpoint: {}", endpoint_url);
        loader = loader.endpoint_url(endpoint_url);
    }

    loader.load().await
}
