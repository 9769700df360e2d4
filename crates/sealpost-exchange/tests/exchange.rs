//! Sender → trigger → receiver against in-memory backends

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use mockall::mock;
use sealpost_core::config::{ExchangeSettings, VaultWriteMode};
use sealpost_core::types::{ObjectCreated, PlaintextSecret, StructuredSecret};
use sealpost_core::{ErrorKind, ExchangeError, ManualClock};
use sealpost_exchange::{
    ReceiveOutcome, Receiver, ReceiverSettings, SendRequest, Sender, Services, SuffixFilter,
    Trigger, TriggerState,
};
use sealpost_secrets::stores::{
    MemoryKeyStore, MemoryNotifier, MemoryObjectStore, MemorySecretVault,
};
use sealpost_secrets::{Notifier, ObjectStore, SecretVault};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};

const RECIPIENT_PUBLIC: &str = include_str!("../../sealpost-secrets/testdata/recipient-public.pem");
const RECIPIENT_PRIVATE: &str =
    include_str!("../../sealpost-secrets/testdata/recipient-private.pem");
const STRANGER_PRIVATE: &str =
    include_str!("../../sealpost-secrets/testdata/stranger-private.pem");

const SOURCE_SECRET: &str = "client-secret";
const VAULT_SECRET: &str = "MySuperSecretAppSecret";
const OBJECT: &str = "encrypted-secret.txt";
const CHANNEL: &str = "arn:aws:sns:us-east-1:123456789012:client-credentials";

mock! {
    pub FailingNotifier {}

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn publish(&self, channel: &str, subject: &str, body: &str) -> Result<(), ExchangeError>;
        fn backend(&self) -> &'static str;
    }
}

/// Vault whose writes wait for a permit, so deliveries can be held mid-flight
struct GatedVault {
    gate: Semaphore,
    written: AtomicUsize,
}

#[async_trait]
impl SecretVault for GatedVault {
    async fn get(&self, name: &str) -> Result<PlaintextSecret, ExchangeError> {
        Err(ExchangeError::secret_not_found(name))
    }

    async fn create(&self, _name: &str, _value: &StructuredSecret) -> Result<(), ExchangeError> {
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn put(&self, name: &str, value: &StructuredSecret) -> Result<(), ExchangeError> {
        self.create(name, value).await
    }

    fn backend(&self) -> &'static str {
        "gated"
    }
}

struct Fixture {
    services: Services,
    objects: Arc<MemoryObjectStore>,
    vault: Arc<MemorySecretVault>,
    notifier: Arc<MemoryNotifier>,
}

fn fixture_with(secret: &str, private_key: &str, objects: MemoryObjectStore) -> Fixture {
    let keys = MemoryKeyStore::new()
        .with_key("recipient-public.pem", RECIPIENT_PUBLIC)
        .with_key("recipient-private.pem", private_key);
    let vault = Arc::new(MemorySecretVault::new().with_secret(SOURCE_SECRET, secret));
    let objects = Arc::new(objects);
    let notifier = Arc::new(MemoryNotifier::new());

    let services = Services::new(
        Arc::new(keys),
        vault.clone(),
        objects.clone(),
        notifier.clone(),
    );
    Fixture {
        services,
        objects,
        vault,
        notifier,
    }
}

fn fixture(secret: &str) -> Fixture {
    fixture_with(secret, RECIPIENT_PRIVATE, MemoryObjectStore::new("exchange"))
}

fn settings() -> ExchangeSettings {
    ExchangeSettings {
        source_secret_name: SOURCE_SECRET.into(),
        public_key_name: "recipient-public.pem".into(),
        private_key_name: "recipient-private.pem".into(),
        vault_secret_name: VAULT_SECRET.into(),
        notify_channel: CHANNEL.into(),
        ..Default::default()
    }
}

async fn stored_value(vault: &MemorySecretVault) -> StructuredSecret {
    let raw = vault.get(VAULT_SECRET).await.unwrap();
    StructuredSecret::from_json(raw.expose()).unwrap()
}

#[tokio::test]
async fn test_end_to_end_hand_off() {
    let fx = fixture("s3cr3t-token");
    let mut events = fx.objects.subscribe();

    let receipt = Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();

    assert_eq!(fx.objects.object_names().await, vec![OBJECT.to_string()]);
    assert_eq!(receipt.ciphertext_bytes, 256);
    let sent = fx.notifier.notifications().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, CHANNEL);
    assert!(sent[0].body.contains(&receipt.link.url));
    assert!(receipt.link.url.starts_with("memory://exchange/"));

    // The stored object is base64 text, not the plaintext
    let stored = fx.objects.get(OBJECT).await.unwrap();
    assert!(!String::from_utf8_lossy(&stored).contains("s3cr3t-token"));

    let event = events.try_recv().unwrap();
    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));
    let trigger = Trigger::new(SuffixFilter::new(".txt"), receiver);
    let report = trigger.deliver(&event).await.unwrap();

    assert_eq!(report.status_code, 200);
    assert_eq!(
        report.body,
        ReceiveOutcome::Stored {
            object_name: OBJECT.into(),
            secret_name: VAULT_SECRET.into(),
        }
    );
    let value = stored_value(&fx.vault).await;
    assert_eq!(value.get("appsecret").unwrap().expose(), "s3cr3t-token");
    assert_eq!(trigger.fired(), 1);
}

#[tokio::test]
async fn test_oversized_plaintext_writes_nothing() {
    let fx = fixture(&"x".repeat(191));

    let err = Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EncryptionError);
    assert!(fx.objects.object_names().await.is_empty());
    assert!(fx.notifier.notifications().await.is_empty());
}

#[tokio::test]
async fn test_largest_plaintext_round_trips() {
    let secret = "y".repeat(190);
    let fx = fixture(&secret);
    Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();

    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));
    receiver.receive(&ObjectCreated::new(OBJECT)).await.unwrap();
    let value = stored_value(&fx.vault).await;
    assert_eq!(value.get("appsecret").unwrap().expose(), secret);
}

#[tokio::test]
async fn test_missing_source_secret() {
    let fx = fixture("unused");
    let mut request = SendRequest::from_settings(&settings());
    request.source_secret_name = "absent".into();

    let err = Sender::new(&fx.services).send(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecretNotFound);
    assert!(fx.objects.object_names().await.is_empty());
}

#[tokio::test]
async fn test_missing_public_key() {
    let fx = fixture("value");
    let mut request = SendRequest::from_settings(&settings());
    request.public_key_name = "absent.pem".into();

    let err = Sender::new(&fx.services).send(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyNotFound);
}

#[tokio::test]
async fn test_notify_failure_keeps_ciphertext() {
    let mut notifier = MockFailingNotifier::new();
    notifier
        .expect_publish()
        .times(1)
        .returning(|channel, _, _| Err(ExchangeError::notify(channel, "topic unreachable")));
    notifier.expect_backend().return_const("mock");

    let objects = Arc::new(MemoryObjectStore::new("exchange"));
    let services = Services::new(
        Arc::new(MemoryKeyStore::new().with_key("recipient-public.pem", RECIPIENT_PUBLIC)),
        Arc::new(MemorySecretVault::new().with_secret(SOURCE_SECRET, "s3cr3t-token")),
        objects.clone(),
        Arc::new(notifier),
    );

    let err = Sender::new(&services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotifyError);
    assert!(objects.contains(OBJECT).await);
}

#[tokio::test]
async fn test_resend_overwrites_and_notifies_again() {
    let fx = fixture("s3cr3t-token");
    let sender = Sender::new(&fx.services);
    let request = SendRequest::from_settings(&settings());

    sender.send(&request).await.unwrap();
    let first = fx.objects.get(OBJECT).await.unwrap();
    sender.send(&request).await.unwrap();
    let second = fx.objects.get(OBJECT).await.unwrap();

    // OAEP is randomized
    assert_ne!(first, second);
    assert_eq!(fx.objects.object_names().await.len(), 1);
    assert_eq!(fx.notifier.notifications().await.len(), 2);
}

#[tokio::test]
async fn test_wrong_private_key_is_reported_not_raised() {
    let fx = fixture_with(
        "s3cr3t-token",
        STRANGER_PRIVATE,
        MemoryObjectStore::new("exchange"),
    );
    Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();

    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));
    let report = receiver.invoke(&ObjectCreated::new(OBJECT)).await;

    assert_eq!(report.status_code, 200);
    assert!(report.is_failure());
    assert_eq!(report.failure_kind(), Some(ErrorKind::DecryptionError));
    assert!(!fx.vault.contains(VAULT_SECRET).await);
}

#[tokio::test]
async fn test_missing_object_is_reported() {
    let fx = fixture("s3cr3t-token");
    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));

    let report = receiver.invoke(&ObjectCreated::new(OBJECT)).await;
    assert_eq!(report.status_code, 200);
    assert_eq!(report.failure_kind(), Some(ErrorKind::StorageReadError));
}

#[tokio::test]
async fn test_corrupt_object_is_decode_error() {
    let fx = fixture("s3cr3t-token");
    fx.objects
        .put(OBJECT, b"this is not base64!".to_vec())
        .await
        .unwrap();

    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));
    let report = receiver.invoke(&ObjectCreated::new(OBJECT)).await;
    assert_eq!(report.failure_kind(), Some(ErrorKind::DecodeError));
}

#[tokio::test]
async fn test_missing_private_key_is_reported() {
    let fx = fixture("s3cr3t-token");
    let mut receiver_settings = ReceiverSettings::from_settings(&settings());
    receiver_settings.private_key_name = "absent.pem".into();

    let report = Receiver::new(&fx.services, receiver_settings)
        .invoke(&ObjectCreated::new(OBJECT))
        .await;
    assert_eq!(report.failure_kind(), Some(ErrorKind::KeyNotFound));
}

#[tokio::test]
async fn test_duplicate_firing_reports_vault_write_error() {
    let fx = fixture("s3cr3t-token");
    Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();

    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));
    let trigger = Trigger::new(SuffixFilter::new(".txt"), receiver);
    let event = ObjectCreated::new(OBJECT);

    let first = trigger.deliver(&event).await.unwrap();
    let second = trigger.deliver(&event).await.unwrap();

    assert!(!first.is_failure());
    assert_eq!(second.status_code, 200);
    assert_eq!(second.failure_kind(), Some(ErrorKind::VaultWriteError));
    assert_eq!(trigger.fired(), 2);

    // The first write is untouched
    let value = stored_value(&fx.vault).await;
    assert_eq!(value.get("appsecret").unwrap().expose(), "s3cr3t-token");
}

#[tokio::test]
async fn test_upsert_mode_accepts_duplicate_firing() {
    let fx = fixture("s3cr3t-token");
    Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();

    let exchange = ExchangeSettings {
        vault_write_mode: VaultWriteMode::Upsert,
        ..settings()
    };
    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&exchange));
    let event = ObjectCreated::new(OBJECT);

    assert!(!receiver.invoke(&event).await.is_failure());
    assert!(!receiver.invoke(&event).await.is_failure());
    assert_eq!(fx.vault.len().await, 2);
}

#[tokio::test]
async fn test_event_for_other_object_reads_configured_name() {
    let fx = fixture("s3cr3t-token");
    Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();

    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));
    let stored = receiver
        .receive(&ObjectCreated::new("another-secret.txt"))
        .await
        .unwrap();
    assert_eq!(stored.object_name, OBJECT);
}

#[tokio::test]
async fn test_trigger_ignores_non_matching_suffix() {
    let fx = fixture("s3cr3t-token");
    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));
    let trigger = Trigger::new(SuffixFilter::new(".txt"), receiver);

    assert!(trigger
        .deliver(&ObjectCreated::new("recipient-public.pem"))
        .await
        .is_none());
    assert_eq!(trigger.fired(), 0);
}

#[tokio::test]
async fn test_trigger_run_counts_firings() {
    let fx = fixture("s3cr3t-token");
    Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();

    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));
    let trigger = Trigger::new(SuffixFilter::new(".txt"), receiver);

    let (tx, rx) = broadcast::channel(8);
    tx.send(ObjectCreated::new("recipient-public.pem")).unwrap();
    tx.send(ObjectCreated::new(OBJECT)).unwrap();
    drop(tx);

    assert_eq!(trigger.run(rx).await, 1);
    assert!(fx.vault.contains(VAULT_SECRET).await);
}

#[tokio::test]
async fn test_link_expires_after_ttl() {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let fx = fixture_with(
        "s3cr3t-token",
        RECIPIENT_PRIVATE,
        MemoryObjectStore::with_clock("exchange", clock.clone()),
    );

    let receipt = Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();
    assert_eq!(receipt.link.expires_at, start + Duration::seconds(1800));

    assert!(fx.objects.open_link(&receipt.link.url).await.is_ok());

    clock.advance(Duration::seconds(1799));
    assert!(fx.objects.open_link(&receipt.link.url).await.is_ok());

    clock.advance(Duration::seconds(1));
    let err = fx.objects.open_link(&receipt.link.url).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageReadError);
}

#[tokio::test]
async fn test_failed_report_names_configured_object() {
    let fx = fixture("s3cr3t-token");
    let receiver = Receiver::new(&fx.services, ReceiverSettings::from_settings(&settings()));

    let report = receiver
        .invoke(&ObjectCreated::new("another-secret.txt"))
        .await;
    match report.body {
        ReceiveOutcome::Failed {
            object_name, kind, ..
        } => {
            assert_eq!(object_name, OBJECT);
            assert_eq!(kind, ErrorKind::StorageReadError);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_trigger_stays_firing_while_any_delivery_runs() {
    let fx = fixture("s3cr3t-token");
    Sender::new(&fx.services)
        .send(&SendRequest::from_settings(&settings()))
        .await
        .unwrap();

    let vault = Arc::new(GatedVault {
        gate: Semaphore::new(0),
        written: AtomicUsize::new(0),
    });
    let services = Services::new(
        fx.services.keys.clone(),
        vault.clone(),
        fx.services.objects.clone(),
        fx.services.notifier.clone(),
    );
    let receiver = Receiver::new(&services, ReceiverSettings::from_settings(&settings()));
    let trigger = Trigger::new(SuffixFilter::new(".txt"), receiver);
    let event = ObjectCreated::new(OBJECT);
    assert_eq!(trigger.state(), TriggerState::Idle);

    let (first, second, ()) = tokio::join!(trigger.deliver(&event), trigger.deliver(&event), async {
        while vault.gate.available_permits() == 0 && trigger.fired() < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(trigger.state(), TriggerState::Firing);

        // Let one delivery finish while the other is still held
        vault.gate.add_permits(1);
        while vault.written.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        assert_eq!(trigger.state(), TriggerState::Firing);

        vault.gate.add_permits(1);
    });

    assert!(!first.unwrap().is_failure());
    assert!(!second.unwrap().is_failure());
    assert_eq!(vault.written.load(Ordering::SeqCst), 2);
    assert_eq!(trigger.state(), TriggerState::Idle);
}
