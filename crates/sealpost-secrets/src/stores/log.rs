//! Notifier that only writes to the log
//!
//! For local runs where no subscriber exists. The body carries the
//! retrieval link, which is a bearer credential, so only its length is
//! logged.

use super::Notifier;
use async_trait::async_trait;
use sealpost_core::ExchangeError;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), ExchangeError> {
        info!(channel, subject, body_len = body.len(), "notification");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "log"
    }
}
