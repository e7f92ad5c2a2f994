//! Configuration parsing and validation for classbook
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - A static user directory (login, password, role)
//! - Ledger file location
//! - Validation with clear error messages

mod directory;
mod schema;
mod validation;

pub use directory::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let raw = parse_raw(&content)?;
    let config = Config::from_raw(raw, path.parent());

    tracing::debug!(
        path = %path.display(),
        users = config.directory.len(),
        "Config loaded"
    );
    Ok(config)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    Ok(Config::from_raw(parse_raw(content)?, None))
}

fn parse_raw(content: &str) -> ConfigResult<RawConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(raw)
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;
