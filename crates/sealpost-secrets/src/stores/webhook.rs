//! HTTP webhook notifier
//!
//! POSTs `{"channel", "subject", "body"}` as JSON to a fixed URL. Any
//! non-success status is a delivery failure.

use super::Notifier;
use anyhow::Result;
use async_trait::async_trait;
use sealpost_core::ExchangeError;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    channel: &'a str,
    subject: &'a str,
    body: &'a str,
}

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), ExchangeError> {
        debug!("Posting notification for {} to webhook", channel);

        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                channel,
                subject,
                body,
            })
            .send()
            .await
            .map_err(|e| ExchangeError::notify(channel, format!("webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ExchangeError::notify(
                channel,
                format!("webhook returned HTTP {}", response.status()),
            ));
        }

        info!("Delivered notification for {} to webhook", channel);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealpost_core::ErrorKind;

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload {
            channel: "ops",
            subject: "Encrypted client credentials",
            body: "https://example.invalid/link",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["channel"], "ops");
        assert_eq!(json["subject"], "Encrypted client credentials");
        assert_eq!(json["body"], "https://example.invalid/link");
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_notify_error() {
        // Port 9 (discard) on loopback is closed in test environments
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook").unwrap();
        let err = notifier.publish("ops", "s", "b").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotifyError);
    }
}
