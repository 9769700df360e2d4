//! Receive command
//!
//! Runs the receiver once per matching object-created event and prints
//! one invocation report per line. Failures are inside the reports; the
//! process still exits 0 so a wrapping event source does not retry.

use anyhow::{Context, Result};
use camino::Utf8Path;
use sealpost_core::types::ObjectCreated;
use sealpost_exchange::{
    parse_s3_event, Receiver, ReceiverSettings, ServiceProvider, SuffixFilter, Trigger,
};
use std::io::Read;

use crate::cli::ReceiveArgs;
use crate::output;

pub async fn run(args: ReceiveArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    config.validate_receiver()?;
    let exchange = &config.config.exchange;

    let events = match &args.event {
        Some(path) => read_events(path)?,
        None => vec![ObjectCreated::new(
            args.object
                .clone()
                .unwrap_or_else(|| exchange.source_object_name.clone()),
        )],
    };

    let provider = ServiceProvider::new(config.config.backends.clone());
    let services = provider.get().await?;

    let receiver = Receiver::new(services, ReceiverSettings::from_settings(exchange));
    let trigger = Trigger::new(SuffixFilter::new(exchange.trigger_suffix.clone()), receiver);

    for event in &events {
        match trigger.deliver(event).await {
            Some(report) => {
                println!("{}", serde_json::to_string(&report)?);
                if let Some(kind) = report.failure_kind() {
                    output::error(&format!("{}: {}", event.object_name, kind));
                }
            }
            None => output::info(&format!(
                "Skipped {} (does not end with {})",
                event.object_name, exchange.trigger_suffix
            )),
        }
    }

    if trigger.fired() == 0 {
        output::warning("No matching object-created events");
    }

    Ok(())
}

fn read_events(path: &Utf8Path) -> Result<Vec<ObjectCreated>> {
    let content = if path.as_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?
    };

    parse_s3_event(&content).context("Invalid S3 event notification")
}
