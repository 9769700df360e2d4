//! Sender side of an exchange
//!
//! Steps run strictly in order and the first failure is returned to the
//! caller. Sealing happens before any write, so an oversized plaintext
//! leaves storage untouched. A notification failure after the write leaves
//! the ciphertext in place; the error tells the caller nobody was notified.

use crate::provider::Services;
use chrono::Duration;
use sealpost_core::config::ExchangeSettings;
use sealpost_core::types::{KeyRole, RetrievalLink};
use sealpost_core::ExchangeError;
use sealpost_secrets::{armor, AuditLog, SecretSealer};
use serde::Serialize;
use tracing::{debug, info};

/// Names and parameters for one send
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub source_secret_name: String,
    pub public_key_name: String,
    pub object_name: String,
    pub notify_channel: String,
    pub notify_subject: String,
    pub link_ttl: Duration,
}

impl SendRequest {
    pub fn from_settings(settings: &ExchangeSettings) -> Self {
        Self {
            source_secret_name: settings.source_secret_name.clone(),
            public_key_name: settings.public_key_name.clone(),
            object_name: settings.source_object_name.clone(),
            notify_channel: settings.notify_channel.clone(),
            notify_subject: settings.notify_subject.clone(),
            link_ttl: settings.link_ttl(),
        }
    }
}

/// What a successful send produced
#[derive(Debug, Clone, Serialize)]
pub struct SendReceipt {
    pub object_name: String,
    pub ciphertext_bytes: usize,
    pub link: RetrievalLink,
}

/// Notification text carrying the link
pub fn notification_body(link: &RetrievalLink) -> String {
    let minutes = link.ttl().num_minutes();
    format!(
        "Here is the link to download the secret. This link will expire after {} minutes.\n\n{}\n\nEOM",
        minutes, link.url
    )
}

pub struct Sender<'a> {
    services: &'a Services,
}

impl<'a> Sender<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self { services }
    }

    pub async fn send(&self, request: &SendRequest) -> Result<SendReceipt, ExchangeError> {
        let result = self.run(request).await;
        let mut audit = AuditLog::new(
            "send",
            &request.object_name,
            self.services.objects.backend(),
        );
        if let Err(e) = &result {
            audit = audit.with_error(e.to_string());
        }
        audit.log();
        result
    }

    async fn run(&self, request: &SendRequest) -> Result<SendReceipt, ExchangeError> {
        let Services {
            keys,
            vault,
            objects,
            notifier,
        } = self.services;

        let plaintext = vault.get(&request.source_secret_name).await?;
        debug!(
            secret = %request.source_secret_name,
            bytes = plaintext.len(),
            "Read source secret"
        );

        let public_key = keys.get(&request.public_key_name, KeyRole::Public).await?;
        let sealer = SecretSealer::from_key(&public_key)?;
        let ciphertext = sealer.seal(&plaintext)?;
        drop(plaintext);
        debug!(
            key_bits = sealer.key_bits(),
            ciphertext_bytes = ciphertext.len(),
            "Sealed secret"
        );

        let ciphertext_bytes = ciphertext.len();
        objects.put(&request.object_name, armor(&ciphertext)).await?;
        info!(object = %request.object_name, "Stored ciphertext");

        let link = objects
            .mint_link(&request.object_name, request.link_ttl)
            .await?;
        debug!(
            object = %request.object_name,
            expires_at = %link.expires_at,
            "Minted retrieval link"
        );

        notifier
            .publish(
                &request.notify_channel,
                &request.notify_subject,
                &notification_body(&link),
            )
            .await?;
        info!(channel = %request.notify_channel, "Sent retrieval link");

        Ok(SendReceipt {
            object_name: request.object_name.clone(),
            ciphertext_bytes,
            link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_notification_body_mentions_link_and_lifetime() {
        let minted = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let link = RetrievalLink::new(
            "https://bucket.example/encrypted-secret.txt?sig=1",
            "encrypted-secret.txt",
            minted,
            Duration::seconds(1800),
        );
        let body = notification_body(&link);
        assert!(body.contains("https://bucket.example/encrypted-secret.txt?sig=1"));
        assert!(body.contains("30 minutes"));
    }

    #[test]
    fn test_request_from_settings() {
        let settings = ExchangeSettings {
            source_secret_name: "client-secret".into(),
            public_key_name: "public.pem".into(),
            notify_channel: "arn:aws:sns:us-east-1:1:t".into(),
            ..Default::default()
        };
        let request = SendRequest::from_settings(&settings);
        assert_eq!(request.object_name, "encrypted-secret.txt");
        assert_eq!(request.link_ttl, Duration::seconds(1800));
        assert_eq!(request.notify_subject, "Encrypted client credentials");
    }
}
