//! Default paths for classbook
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/classbook/config.toml` or `~/.config/classbook/config.toml`
//! - Data: `$XDG_DATA_HOME/classbook` or `~/.local/share/classbook`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const CLASSBOOK_CONFIG_ENV: &str = "CLASSBOOK_CONFIG";

/// Environment variable for overriding the ledger file path
pub const CLASSBOOK_LEDGER_ENV: &str = "CLASSBOOK_LEDGER";

/// Environment variable for overriding the data directory
pub const CLASSBOOK_DATA_DIR_ENV: &str = "CLASSBOOK_DATA_DIR";

/// Ledger filename within the data directory
pub const LEDGER_FILENAME: &str = "storage.json";

/// Application subdirectory name
const APP_DIR: &str = "classbook";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/classbook/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/classbook/config.toml`
/// 3. `./config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("config.toml")
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$CLASSBOOK_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/classbook` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/classbook` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(CLASSBOOK_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking CLASSBOOK_DATA_DIR.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Default location of the ledger file
pub fn default_ledger_path() -> PathBuf {
    default_data_dir().join(LEDGER_FILENAME)
}
