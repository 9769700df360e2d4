//! Send command

use anyhow::{Context, Result};
use camino::Utf8Path;
use sealpost_exchange::{SendRequest, Sender, ServiceProvider};

use crate::cli::SendArgs;
use crate::output;

pub async fn run(args: SendArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    config.validate_sender()?;

    let provider = ServiceProvider::new(config.config.backends.clone());
    let services = provider.get().await?;
    let request = SendRequest::from_settings(&config.config.exchange);

    let spinner = output::spinner("Sealing and depositing secret...");
    let result = Sender::new(services).send(&request).await;
    spinner.finish_and_clear();

    let receipt = result.with_context(|| {
        format!(
            "Failed to hand off {} as {}",
            request.source_secret_name, request.object_name
        )
    })?;

    if args.json {
        let mut value = serde_json::to_value(&receipt)?;
        if !args.show_link {
            value["link"]["url"] = serde_json::Value::String("[REDACTED]".to_string());
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    output::success(&format!("Deposited {}", receipt.object_name));
    output::kv("Ciphertext", &format!("{} bytes", receipt.ciphertext_bytes));
    output::kv("Notified", &request.notify_channel);
    output::kv("Link expires", &receipt.link.expires_at.to_rfc3339());
    if args.show_link {
        output::kv("Link", &receipt.link.url);
    }

    Ok(())
}
