//! Command implementations

pub mod config;
pub mod receive;
pub mod send;

use anyhow::{Context, Result};
use camino::Utf8Path;
use sealpost_core::SealpostConfig;

/// Load sealpost.yaml (if any) with environment overrides applied
pub(crate) fn load_config(path: Option<&Utf8Path>) -> Result<SealpostConfig> {
    SealpostConfig::load_or_env(path).context("Failed to load configuration")
}
