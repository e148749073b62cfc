//! Configuration file resolution and loading
//!
//! Configuration file location follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config directory (`~/.config/setu/<module>.toml` on Linux)
//! 4. System-wide config (`/etc/setu/<module>.toml`)
//!
//! A file named explicitly (CLI or ENV) must exist. A missing discovered file
//! is not an error: the service starts on compiled defaults with a warning.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where the configuration file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Named on the command line or through the environment
    Explicit(PathBuf),
    /// Found in one of the standard config directories
    Discovered(PathBuf),
    /// No config file; compiled defaults apply
    Defaults,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
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

/// Resolve the configuration file for a module
///
/// # Arguments
/// * `cli_arg` - Path given on the command line, if any
/// * `env_var_name` - Environment variable that may name the file
/// * `module_name` - Module name, used for the discovered file name (`<module>.toml`)
pub fn resolve_config_location(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    module_name: &str,
) -> ConfigLocation {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return ConfigLocation::Explicit(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(path) = env_value(env_var_name) {
        return ConfigLocation::Explicit(PathBuf::from(path));
    }

    // Priority 3/4: Standard locations
    standard_config_paths(module_name)
        .into_iter()
        .find(|path| path.exists())
        .map(ConfigLocation::Discovered)
        .unwrap_or(ConfigLocation::Defaults)
}

/// Candidate config file paths, most specific first
pub fn standard_config_paths(module_name: &str) -> Vec<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let mut paths = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("setu").join(&file_name));
    }

    if cfg!(unix) {
        paths.push(PathBuf::from("/etc/setu").join(&file_name));
    }

    paths
}

/// Load a TOML configuration from the resolved location
///
/// Returns `T::default()` when there is no file to read, or when a discovered
/// file disappeared between resolution and load.
pub fn load_toml_config<T>(location: &ConfigLocation) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let path = match location {
        ConfigLocation::Defaults => {
            info!("No configuration file found, using compiled defaults");
            return Ok(T::default());
        }
        ConfigLocation::Explicit(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            path
        }
        ConfigLocation::Discovered(path) => {
            if !path.exists() {
                warn!(
                    "Configuration file {} vanished, using compiled defaults",
                    path.display()
                );
                return Ok(T::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Parse TOML text into a configuration structure
pub fn parse_toml_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// Read an environment variable, ignoring unset, empty and whitespace-only values
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
