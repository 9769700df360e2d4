//! Config command

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use sealpost_core::config::{KeyStoreBackend, NotifierBackend, ObjectStoreBackend, VaultBackend};
use sealpost_core::SealpostConfig;

use crate::cli::{ConfigCommands, ConfigInitArgs, ConfigShowArgs, ConfigValidateArgs, Side};
use crate::output;

/// Starter configuration mirroring a single-bucket AWS deployment
const TEMPLATE: &str = r#"# sealpost configuration
version: "1"

exchange:
  # Sender side
  source_secret_name: client-secret
  public_key_name: public.pem
  notify_channel: arn:aws:sns:us-east-1:123456789012:client-credentials
  notify_subject: Encrypted client credentials
  link_ttl_seconds: 1800

  # Shared
  source_object_name: encrypted-secret.txt
  trigger_suffix: .txt

  # Receiver side
  private_key_name: private.pem
  vault_secret_name: MySuperSecretAppSecret
  vault_secret_field: appsecret
  vault_write_mode: create   # or: upsert

backends:
  region: us-east-1
  bucket: my-exchange-bucket
  # endpoint: http://localhost:4566
  keys:
    type: s3
  vault:
    type: aws-secrets-manager
  objects:
    type: s3
  notifier:
    type: sns
"#;

pub fn run(cmd: ConfigCommands, config_path: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Init(args) => init(args),
        ConfigCommands::Validate(args) => validate(args, config_path),
        ConfigCommands::Show(args) => show(args, config_path),
    }
}

fn init(args: ConfigInitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(anyhow!(
            "File {} already exists. Use --force to overwrite.",
            args.output
        ));
    }

    std::fs::write(&args.output, TEMPLATE)?;

    output::success(&format!("Created {}", args.output));
    output::info("Edit the names and bucket, then run `sealpost config validate`");
    Ok(())
}

fn validate(args: ConfigValidateArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let spinner = output::spinner("Validating configuration...");
    let loaded = super::load_config(config_path);
    spinner.finish_and_clear();
    let config = loaded?;

    match args.side {
        Side::Sender => config.validate_sender()?,
        Side::Receiver => config.validate_receiver()?,
        Side::Both => {
            config.validate_sender()?;
            config.validate_receiver()?;
        }
    }

    match &config.config_path {
        Some(path) => output::success(&format!("Configuration is valid: {}", path)),
        None => output::success("Configuration is valid (environment only)"),
    }
    describe(&config);
    Ok(())
}

fn describe(config: &SealpostConfig) {
    let backends = &config.config.backends;
    output::kv("Region", &backends.region);
    if let Some(bucket) = &backends.bucket {
        output::kv("Bucket", bucket);
    }
    output::kv(
        "Keys",
        match &backends.keys {
            KeyStoreBackend::Memory => "memory",
            KeyStoreBackend::File { .. } => "file",
            KeyStoreBackend::S3 => "s3",
        },
    );
    output::kv(
        "Vault",
        match &backends.vault {
            VaultBackend::Memory => "memory",
            VaultBackend::AwsSecretsManager => "aws-secrets-manager",
            VaultBackend::Hashicorp { .. } => "hashicorp",
        },
    );
    output::kv(
        "Objects",
        match &backends.objects {
            ObjectStoreBackend::Memory => "memory",
            ObjectStoreBackend::S3 => "s3",
        },
    );
    output::kv(
        "Notifier",
        match &backends.notifier {
            NotifierBackend::Memory => "memory",
            NotifierBackend::Log => "log",
            NotifierBackend::Sns => "sns",
            NotifierBackend::Webhook { .. } => "webhook",
        },
    );
    output::kv(
        "Vault write mode",
        &config.config.exchange.vault_write_mode.to_string(),
    );
}

fn show(args: ConfigShowArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config_path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config.config)?);
    } else {
        println!("{}", SealpostConfig::to_yaml(&config.config)?);
    }
    Ok(())
}
