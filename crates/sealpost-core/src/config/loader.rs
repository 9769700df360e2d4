//! Configuration file loading, environment overrides and validation

use super::types::{SealpostConfigFile, MAX_LINK_TTL_SECONDS};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["sealpost.yaml", "sealpost.yml"];

/// Loaded sealpost configuration
#[derive(Debug, Clone)]
pub struct SealpostConfig {
    /// The parsed configuration
    pub config: SealpostConfigFile,

    /// Path to the configuration file, if one was read
    pub config_path: Option<Utf8PathBuf>,
}

impl SealpostConfig {
    /// Load configuration from the specified path or search for it
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = match path {
            Some(p) => (p.to_owned(), Self::read(p)?),
            None => Self::find_config()?,
        };

        let config = Self::parse(&content)?;
        debug!("Loaded configuration from {}", config_path);

        Ok(Self {
            config,
            config_path: Some(config_path),
        })
    }

    /// Load like [`SealpostConfig::load`], but fall back to defaults when no
    /// file is given and none is found. Environment overrides are applied
    /// in both cases, so function-style deployments can run on env alone.
    pub fn load_or_env(path: Option<&Utf8Path>) -> Result<Self> {
        let mut loaded = match path {
            Some(_) => Self::load(path)?,
            None => match Self::load(None) {
                Ok(found) => found,
                Err(Error::ConfigNotFound { .. }) => {
                    debug!("No sealpost.yaml found, using defaults and environment");
                    Self {
                        config: SealpostConfigFile::default(),
                        config_path: None,
                    }
                }
                Err(e) => return Err(e),
            },
        };
        loaded.apply_env_overrides()?;
        Ok(loaded)
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<SealpostConfigFile> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Render a configuration as YAML
    pub fn to_yaml(config: &SealpostConfigFile) -> Result<String> {
        Ok(serde_yaml_ng::to_string(config)?)
    }

    fn read(path: &Utf8Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "sealpost.yaml (searched current and parent directories)",
        ))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    ///
    /// `SEALPOST_*` names take precedence over the plain deployment names
    /// (`REGION`, `BUCKET_NAME`, `MY_SECRET_NAME`, `TOPIC_ARN`). `FILE_KEY`
    /// names the key of whichever side is running: the sender reads it as the
    /// public key and the receiver as the private key.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |names: &[&str]| names.iter().find_map(|n| lookup(*n));

        let backends = &mut self.config.backends;
        if let Some(val) = pick(&["SEALPOST_REGION", "REGION"]) {
            backends.region = val;
        }
        if let Some(val) = pick(&["SEALPOST_BUCKET", "BUCKET_NAME"]) {
            backends.bucket = Some(val);
        }
        if let Some(val) = pick(&["SEALPOST_ENDPOINT"]) {
            backends.endpoint = Some(val);
        }

        let exchange = &mut self.config.exchange;
        if let Some(val) = pick(&["SEALPOST_SOURCE_SECRET_NAME", "MY_SECRET_NAME"]) {
            exchange.source_secret_name = val;
        }
        if let Some(val) = pick(&["SEALPOST_NOTIFY_CHANNEL", "TOPIC_ARN"]) {
            exchange.notify_channel = val;
        }
        if let Some(val) = pick(&["SEALPOST_PUBLIC_KEY_NAME", "FILE_KEY"]) {
            exchange.public_key_name = val;
        }
        if let Some(val) = pick(&["SEALPOST_PRIVATE_KEY_NAME", "FILE_KEY"]) {
            exchange.private_key_name = val;
        }
        if let Some(val) = pick(&["SEALPOST_SOURCE_OBJECT_NAME"]) {
            exchange.source_object_name = val;
        }
        if let Some(val) = pick(&["SEALPOST_VAULT_SECRET_NAME"]) {
            exchange.vault_secret_name = val;
        }
        if let Some(val) = pick(&["SEALPOST_VAULT_WRITE_MODE"]) {
            exchange.vault_write_mode = val.parse().map_err(Error::invalid_config)?;
        }
        if let Some(val) = pick(&["SEALPOST_LINK_TTL_SECONDS"]) {
            exchange.link_ttl_seconds = val.parse().map_err(|_| {
                Error::invalid_config("SEALPOST_LINK_TTL_SECONDS must be a valid number")
            })?;
        }
        if let Some(val) = pick(&["SEALPOST_TRIGGER_SUFFIX"]) {
            exchange.trigger_suffix = val;
        }

        Ok(())
    }

    /// Checks shared by both sides of the exchange
    pub fn validate(&self) -> Result<()> {
        let exchange = &self.config.exchange;

        if exchange.link_ttl_seconds == 0 || exchange.link_ttl_seconds > MAX_LINK_TTL_SECONDS {
            return Err(Error::invalid_config(format!(
                "link_ttl_seconds must be between 1 and {}, got {}",
                MAX_LINK_TTL_SECONDS, exchange.link_ttl_seconds
            )));
        }
        if exchange.trigger_suffix.is_empty() {
            return Err(Error::invalid_config("trigger_suffix must not be empty"));
        }
        require("exchange.source_object_name", &exchange.source_object_name)?;
        Ok(())
    }

    /// Names the sender needs
    pub fn validate_sender(&self) -> Result<()> {
        self.validate()?;
        let exchange = &self.config.exchange;
        require("exchange.source_secret_name", &exchange.source_secret_name)?;
        require("exchange.public_key_name", &exchange.public_key_name)?;
        require("exchange.notify_channel", &exchange.notify_channel)?;
        Ok(())
    }

    /// Names the receiver needs
    pub fn validate_receiver(&self) -> Result<()> {
        self.validate()?;
        let exchange = &self.config.exchange;
        require("exchange.private_key_name", &exchange.private_key_name)?;
        require("exchange.vault_secret_name", &exchange.vault_secret_name)?;
        require("exchange.vault_secret_field", &exchange.vault_secret_field)?;
        Ok(())
    }

    /// Get the inner configuration file
    pub fn inner(&self) -> &SealpostConfigFile {
        &self.config
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::missing_field(field))
    } else {
        Ok(())
    }
}
