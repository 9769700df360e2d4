//! SNS notifier

use super::Notifier;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client;
use sealpost_core::ExchangeError;
use tracing::info;

/// SNS rejects subjects longer than this
const MAX_SUBJECT_LEN: usize = 100;

#[derive(Clone)]
pub struct SnsNotifier {
    client: Client,
}

impl SnsNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = aws_sdk_sns::config::Builder::from(sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

impl std::fmt::Debug for SnsNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnsNotifier").finish_non_exhaustive()
    }
}

fn truncate_subject(subject: &str) -> &str {
    match subject.char_indices().nth(MAX_SUBJECT_LEN) {
        Some((idx, _)) => &subject[..idx],
        None => subject,
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), ExchangeError> {
        if channel.is_empty() {
            return Err(ExchangeError::notify(channel, "topic ARN is empty"));
        }

        let output = self
            .client
            .publish()
            .topic_arn(channel)
            .subject(truncate_subject(subject))
            .message(body)
            .send()
            .await
            .map_err(|e| ExchangeError::notify(channel, DisplayErrorContext(&e).to_string()))?;

        info!(
            "Published notification to {} (message id: {})",
            channel,
            output.message_id().unwrap_or("none")
        );
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sns"
    }
}
