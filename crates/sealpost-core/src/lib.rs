//! # sealpost-core
//!
//! Core library for sealpost providing:
//! - Configuration file parsing (sealpost.yaml) with environment overrides
//! - The exchange error taxonomy shared by every accessor and orchestrator
//! - Data model types for keys, secrets, ciphertext and retrieval links
//! - An injectable clock for link expiry

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SealpostConfig;
pub use error::{Error, ErrorKind, ExchangeError, Result};
