//! AWS Secrets Manager backend

use super::SecretVault;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, SdkError};
use aws_sdk_secretsmanager::Client;
use sealpost_core::types::{PlaintextSecret, StructuredSecret};
use sealpost_core::ExchangeError;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AwsSecretVault {
    client: Client,
}

impl AwsSecretVault {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = aws_sdk_secretsmanager::config::Builder::from(sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

impl std::fmt::Debug for AwsSecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretVault").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretVault for AwsSecretVault {
    async fn get(&self, name: &str) -> Result<PlaintextSecret, ExchangeError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| {
                let not_found = matches!(
                    &err,
                    SdkError::ServiceError(ctx) if ctx.err().is_resource_not_found_exception()
                );
                if !not_found {
                    warn!(
                        "get_secret_value for {} failed: {}",
                        name,
                        DisplayErrorContext(&err)
                    );
                }
                ExchangeError::secret_not_found(name)
            })?;

        // Binary secrets are not supported; the sender only handles strings
        let value = output
            .secret_string()
            .ok_or_else(|| ExchangeError::secret_not_found(name))?;

        debug!("Read secret {} from Secrets Manager", name);
        Ok(PlaintextSecret::from(value))
    }

    async fn create(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError> {
        let payload = value.to_json();
        match self
            .client
            .create_secret()
            .name(name)
            .secret_string(payload.as_str())
            .send()
            .await
        {
            Ok(_) => {
                info!("Created secret {} in Secrets Manager", name);
                Ok(())
            }
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_resource_exists_exception() => {
                Err(ExchangeError::vault_write(name, "secret already exists"))
            }
            Err(err) => Err(ExchangeError::vault_write(
                name,
                format!("create_secret failed: {}", DisplayErrorContext(&err)),
            )),
        }
    }

    async fn put(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError> {
        let payload = value.to_json();
        match self
            .client
            .put_secret_value()
            .secret_id(name)
            .secret_string(payload.as_str())
            .send()
            .await
        {
            Ok(_) => {
                info!("Wrote new version of secret {} in Secrets Manager", name);
                Ok(())
            }
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_resource_not_found_exception() => {
                debug!("Secret {} absent, creating it", name);
                self.create(name, value).await
            }
            Err(err) => Err(ExchangeError::vault_write(
                name,
                format!("put_secret_value failed: {}", DisplayErrorContext(&err)),
            )),
        }
    }

    fn backend(&self) -> &'static str {
        "aws-secrets-manager"
    }
}
