//! Configuration loading and config file resolution
//!
//! Config file location follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`IMPEX_CONFIG`)
//! 3. OS-dependent default (`<config dir>/impex/config.toml`)
//!
//! A missing config file is never fatal: a warning is logged and built-in
//! defaults are used. A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "IMPEX_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Opera profile directory override
    ///
    /// Opera-format importers look for their files here instead of the
    /// platform default profile location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opera_profile: Option<PathBuf>,

    /// Default options per importer identifier (`[importers.HtmlBookmarks]`)
    #[serde(default)]
    pub importers: HashMap<String, toml::Table>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Default options configured for one importer, if any
    pub fn importer_options(&self, identifier: &str) -> Option<&toml::Table> {
        self.importers.get(identifier)
    }
}

/// Resolve the config file path following the priority order above
///
/// Returns `None` when no candidate location can be determined.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: OS-dependent default
    default_config_path()
}

/// Platform default config file (`~/.config/impex/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("impex").join("config.toml"))
}

/// Load a TOML config file
///
/// Missing file → warning + defaults. Unreadable or malformed file → `Error::Config`.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve and load configuration in one step
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => load_toml_config(&path),
        None => {
            warn!("Could not determine config directory, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write a config file (creates parent directories)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}
