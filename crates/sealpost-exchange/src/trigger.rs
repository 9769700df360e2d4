//! Object-created trigger
//!
//! Two states: idle and firing. A matching event moves idle to firing,
//! runs the receiver, and returns to idle. Delivery is at-least-once, so
//! the same object name may fire more than once; the receiver's report
//! absorbs the resulting vault-write failure.

use crate::receiver::{InvocationReport, Receiver};
use chrono::{DateTime, Utc};
use sealpost_core::types::ObjectCreated;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Matches object names by suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixFilter {
    suffix: String,
}

impl SuffixFilter {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn matches(&self, object_name: &str) -> bool {
        object_name.ends_with(&self.suffix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Firing,
}

pub struct Trigger<'a> {
    filter: SuffixFilter,
    receiver: Receiver<'a>,
    /// Deliveries currently running the receiver
    in_flight: AtomicUsize,
    fired: AtomicU64,
}

impl<'a> Trigger<'a> {
    pub fn new(filter: SuffixFilter, receiver: Receiver<'a>) -> Self {
        Self {
            filter,
            receiver,
            in_flight: AtomicUsize::new(0),
            fired: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> TriggerState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            TriggerState::Firing
        } else {
            TriggerState::Idle
        }
    }

    /// Number of times the receiver has been invoked
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }

    /// Deliver one event. Returns `None` when the filter rejects it.
    pub async fn deliver(&self, event: &ObjectCreated) -> Option<InvocationReport> {
        if !self.filter.matches(&event.object_name) {
            debug!(
                object = %event.object_name,
                suffix = %self.filter.suffix(),
                "Ignoring object outside the trigger filter"
            );
            return None;
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.fired.fetch_add(1, Ordering::SeqCst);
        info!(object = %event.object_name, "Trigger firing");

        let report = self.receiver.invoke(event).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(report)
    }

    /// Consume events until the channel closes; returns the number of firings
    pub async fn run(&self, mut events: broadcast::Receiver<ObjectCreated>) -> u64 {
        let mut firings = 0;
        loop {
            match events.recv().await {
                Ok(event) => {
                    if self.deliver(&event).await.is_some() {
                        firings += 1;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Trigger lagged behind object events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!(firings, "Event channel closed");
        firings
    }
}

#[derive(Debug, Deserialize)]
struct S3Event {
    #[serde(rename = "Records", default)]
    records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S3EventRecord {
    event_name: String,
    #[serde(default)]
    event_time: Option<DateTime<Utc>>,
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
    #[serde(default)]
    size: Option<u64>,
}

/// Parse an S3 event notification into object-created events
///
/// Records other than `ObjectCreated:*` are dropped. Keys arrive
/// form-urlencoded (`+` for space) and are decoded.
pub fn parse_s3_event(json: &str) -> serde_json::Result<Vec<ObjectCreated>> {
    let event: S3Event = serde_json::from_str(json)?;

    Ok(event
        .records
        .into_iter()
        .filter(|r| r.event_name.starts_with("ObjectCreated:"))
        .map(|r| {
            let spaced = r.s3.object.key.replace('+', " ");
            let object_name = match urlencoding::decode(&spaced) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => spaced,
            };
            ObjectCreated {
                object_name,
                bucket: Some(r.s3.bucket.name),
                size: r.s3.object.size,
                event_time: r.event_time,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"{
      "Records": [
        {
          "eventVersion": "2.1",
          "eventSource": "aws:s3",
          "eventTime": "2026-03-01T10:00:00.000Z",
          "eventName": "ObjectCreated:Put",
          "s3": {
            "bucket": { "name": "exchange-bucket" },
            "object": { "key": "encrypted-secret.txt", "size": 344 }
          }
        },
        {
          "eventName": "ObjectRemoved:Delete",
          "s3": {
            "bucket": { "name": "exchange-bucket" },
            "object": { "key": "old.txt" }
          }
        },
        {
          "eventName": "ObjectCreated:CompleteMultipartUpload",
          "s3": {
            "bucket": { "name": "exchange-bucket" },
            "object": { "key": "dir/my+secret%281%29.txt" }
          }
        }
      ]
    }"#;

    #[test]
    fn test_suffix_filter() {
        let filter = SuffixFilter::new(".txt");
        assert!(filter.matches("encrypted-secret.txt"));
        assert!(!filter.matches("public.pem"));
        assert!(!filter.matches("encrypted-secret.txt.bak"));
    }

    #[test]
    fn test_parse_keeps_created_records() {
        let events = parse_s3_event(EVENT).unwrap();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].object_name, "encrypted-secret.txt");
        assert_eq!(events[0].bucket.as_deref(), Some("exchange-bucket"));
        assert_eq!(events[0].size, Some(344));
        assert!(events[0].event_time.is_some());

        assert_eq!(events[1].object_name, "dir/my secret(1).txt");
        assert_eq!(events[1].size, None);
    }

    #[test]
    fn test_parse_without_records() {
        assert!(parse_s3_event("{}").unwrap().is_empty());
        assert!(parse_s3_event("not json").is_err());
    }
}
