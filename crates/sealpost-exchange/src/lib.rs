//! Secret exchange orchestration for sealpost
//!
//! - [`Sender`] reads a plaintext and the recipient's public key, seals,
//!   stores the ciphertext, mints a retrieval link and notifies.
//! - [`Receiver`] opens the stored ciphertext with the private key and
//!   writes the plaintext to the vault. [`Receiver::invoke`] wraps the run in
//!   an [`InvocationReport`] that always carries a success status, so an
//!   at-least-once event source never retries a non-idempotent write.
//! - [`Trigger`] filters object-created events by suffix and fires the
//!   receiver once per matching event.
//! - [`ServiceProvider`] builds the accessor backends once per process.

pub mod provider;
pub mod receiver;
pub mod sender;
pub mod trigger;

pub use provider::{ServiceProvider, Services};
pub use receiver::{InvocationReport, ReceiveOutcome, Receiver, ReceiverSettings, StoredSecret};
pub use sender::{SendReceipt, SendRequest, Sender};
pub use trigger::{parse_s3_event, SuffixFilter, Trigger, TriggerState};
