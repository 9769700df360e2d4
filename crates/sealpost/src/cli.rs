//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// sealpost - encrypt a secret for a recipient, deposit it, and notify
#[derive(Parser, Debug)]
#[command(name = "sealpost")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to sealpost.yaml
    #[arg(short, long, global = true, env = "SEALPOST_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seal the source secret, store it, and send the retrieval link
    Send(SendArgs),

    /// Decrypt a delivered ciphertext into the secret vault
    Receive(ReceiveArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Print the receipt as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print the retrieval link (it grants read access until expiry)
    #[arg(long)]
    pub show_link: bool,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// S3 event notification JSON file, or `-` for stdin
    #[arg(short, long, conflicts_with = "object")]
    pub event: Option<Utf8PathBuf>,

    /// Object name to report as created (default: the configured object)
    #[arg(short, long)]
    pub object: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a starter sealpost.yaml
    Init(ConfigInitArgs),

    /// Validate the configuration
    Validate(ConfigValidateArgs),

    /// Show the resolved configuration, including environment overrides
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "sealpost.yaml")]
    pub output: Utf8PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigValidateArgs {
    /// Which side to validate for
    #[arg(long, value_enum, default_value_t = Side::Both)]
    pub side: Side,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Sender,
    Receiver,
    Both,
}
