//! Receiver side of an exchange
//!
//! [`Receiver::receive`] is an ordinary fallible operation. The event
//! source calls [`Receiver::invoke`] instead, which folds any failure into
//! an [`InvocationReport`] with status 200: the triggering event is not
//! safe to retry (a second create on the same vault name fails), so the
//! failure is logged at error level and reported in the body rather than
//! raised.
//!
//! Key, object and vault names are fixed by configuration, not derived
//! from the event, so one deployment carries one exchange at a time.

use crate::provider::Services;
use sealpost_core::config::{ExchangeSettings, VaultWriteMode};
use sealpost_core::types::{KeyRole, ObjectCreated, StructuredSecret};
use sealpost_core::{ErrorKind, ExchangeError};
use sealpost_secrets::{dearmor, redact_exchange_message, AuditLog, SecretOpener};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Fixed names the receiver works with
#[derive(Debug, Clone)]
pub struct ReceiverSettings {
    pub private_key_name: String,
    pub object_name: String,
    pub vault_secret_name: String,
    pub vault_secret_field: String,
    pub write_mode: VaultWriteMode,
}

impl ReceiverSettings {
    pub fn from_settings(settings: &ExchangeSettings) -> Self {
        Self {
            private_key_name: settings.private_key_name.clone(),
            object_name: settings.source_object_name.clone(),
            vault_secret_name: settings.vault_secret_name.clone(),
            vault_secret_field: settings.vault_secret_field.clone(),
            write_mode: settings.vault_write_mode,
        }
    }
}

/// A successful receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSecret {
    pub object_name: String,
    pub secret_name: String,
}

/// Body of an invocation report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ReceiveOutcome {
    Stored {
        object_name: String,
        secret_name: String,
    },
    Failed {
        object_name: String,
        kind: ErrorKind,
        message: String,
    },
}

/// What the event source sees. `status_code` is always 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationReport {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ReceiveOutcome,
}

impl InvocationReport {
    pub const STATUS_OK: u16 = 200;

    /// `object_name` is the object the receiver read, which is also what
    /// `Stored` carries
    pub fn from_result(object_name: &str, result: Result<StoredSecret, ExchangeError>) -> Self {
        let body = match result {
            Ok(stored) => ReceiveOutcome::Stored {
                object_name: stored.object_name,
                secret_name: stored.secret_name,
            },
            Err(e) => ReceiveOutcome::Failed {
                object_name: object_name.to_string(),
                kind: e.kind(),
                message: redact_exchange_message(&e.to_string()),
            },
        };
        Self {
            status_code: Self::STATUS_OK,
            body,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.body, ReceiveOutcome::Failed { .. })
    }

    /// Kind of the embedded failure, if any
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match &self.body {
            ReceiveOutcome::Failed { kind, .. } => Some(*kind),
            ReceiveOutcome::Stored { .. } => None,
        }
    }
}

pub struct Receiver<'a> {
    services: &'a Services,
    settings: ReceiverSettings,
}

impl<'a> Receiver<'a> {
    pub fn new(services: &'a Services, settings: ReceiverSettings) -> Self {
        Self { services, settings }
    }

    pub fn settings(&self) -> &ReceiverSettings {
        &self.settings
    }

    /// Entry point for the event source; never fails
    pub async fn invoke(&self, event: &ObjectCreated) -> InvocationReport {
        let result = self.receive(event).await;
        let report = InvocationReport::from_result(&self.settings.object_name, result);

        if let ReceiveOutcome::Failed { kind, message, .. } = &report.body {
            error!(
                kind = %kind,
                object = %self.settings.object_name,
                event_object = %event.object_name,
                error = %message,
                "Receive failed; reporting success to the event source to suppress retries"
            );
        }
        report
    }

    pub async fn receive(&self, event: &ObjectCreated) -> Result<StoredSecret, ExchangeError> {
        if event.object_name != self.settings.object_name {
            warn!(
                event_object = %event.object_name,
                configured_object = %self.settings.object_name,
                "Event names a different object; reading the configured one"
            );
        }

        let result = self.run().await;
        let mut audit = AuditLog::new(
            "receive",
            &self.settings.vault_secret_name,
            self.services.vault.backend(),
        );
        if let Err(e) = &result {
            audit = audit.with_error(e.to_string());
        }
        audit.log();
        result
    }

    async fn run(&self) -> Result<StoredSecret, ExchangeError> {
        let Services {
            keys,
            vault,
            objects,
            ..
        } = self.services;
        let settings = &self.settings;

        let private_key = keys
            .get(&settings.private_key_name, KeyRole::Private)
            .await?;

        let stored = objects.get(&settings.object_name).await?;
        let ciphertext = dearmor(&settings.object_name, &stored)?;
        debug!(
            object = %settings.object_name,
            ciphertext_bytes = ciphertext.len(),
            "Read ciphertext"
        );

        let opener = SecretOpener::from_key(&private_key)?;
        let plaintext = opener.open(&ciphertext)?;
        drop(private_key);

        let value = StructuredSecret::single(settings.vault_secret_field.clone(), plaintext);
        match settings.write_mode {
            VaultWriteMode::Create => vault.create(&settings.vault_secret_name, &value).await?,
            VaultWriteMode::Upsert => vault.put(&settings.vault_secret_name, &value).await?,
        }
        info!(
            secret = %settings.vault_secret_name,
            mode = %settings.write_mode,
            "Stored secret in vault"
        );

        Ok(StoredSecret {
            object_name: settings.object_name.clone(),
            secret_name: settings.vault_secret_name.clone(),
        })
    }
}
