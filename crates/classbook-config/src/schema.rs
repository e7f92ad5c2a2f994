//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Ledger settings
    #[serde(default)]
    pub ledger: RawLedgerConfig,

    /// Static user directory
    #[serde(default)]
    pub users: Vec<RawUser>,
}

/// Ledger settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLedgerConfig {
    /// Ledger file (relative paths resolve against the config file's directory)
    pub path: Option<PathBuf>,
}

/// Raw user definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawUser {
    pub login: String,
    pub password: String,
    pub role: RawRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawRole {
    Teacher,
    Student,
}
