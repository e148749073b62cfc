//! Configuration for setu-triage
//!
//! Bootstrap configuration only; nothing changes while running.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--port`, `--text-analyzer-url`, ...)
//! 2. Environment variables (`SETU_PORT`, `SETU_TEXT_ANALYZER_URL`, ...)
//! 3. TOML configuration file (`--config` / `SETU_CONFIG` / standard locations)
//! 4. Built-in defaults
//!
//! Priorities 1 and 2 arrive together as [`ConfigOverrides`] (clap resolves
//! CLI over ENV).

use crate::fusion::FusionConfig;
use serde::Deserialize;
use setu_common::config::{load_toml_config, resolve_config_location, LoggingConfig};
use setu_common::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Module name, used for the discovered config file name (`triage.toml`)
pub const MODULE_NAME: &str = "triage";

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SETU_CONFIG";

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_text_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_image_url() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_analyzer_timeout_ms() -> u64 {
    3000
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

fn default_assistant_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_assistant_model() -> String {
    "aapda-assistant".to_string()
}

fn default_assistant_timeout_ms() -> u64 {
    60_000
}

/// Service configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriageConfig {
    /// Interface the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub analyzers: AnalyzersConfig,

    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            logging: LoggingConfig::default(),
            analyzers: AnalyzersConfig::default(),
            fusion: FusionConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

/// Analyzer service endpoints
///
/// An empty URL disables that analyzer; its modality is then never requested.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyzersConfig {
    #[serde(default = "default_text_url")]
    pub text_url: String,

    #[serde(default = "default_image_url")]
    pub image_url: String,

    /// Per-call budget for each analyzer
    #[serde(default = "default_analyzer_timeout_ms")]
    pub timeout_ms: u64,

    /// Budget for readiness probes
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for AnalyzersConfig {
    fn default() -> Self {
        Self {
            text_url: default_text_url(),
            image_url: default_image_url(),
            timeout_ms: default_analyzer_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl AnalyzersConfig {
    pub fn text_endpoint(&self) -> Option<&str> {
        non_blank(&self.text_url)
    }

    pub fn image_endpoint(&self) -> Option<&str> {
        non_blank(&self.image_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Emergency assistant (LLM) settings
///
/// An empty URL disables the assistant; `/chat` then always answers with the
/// fallback message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_url")]
    pub url: String,

    #[serde(default = "default_assistant_model")]
    pub model: String,

    #[serde(default = "default_assistant_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            url: default_assistant_url(),
            model: default_assistant_model(),
            timeout_ms: default_assistant_timeout_ms(),
        }
    }
}

impl AssistantConfig {
    pub fn endpoint(&self) -> Option<&str> {
        non_blank(&self.url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Values from the command line or environment that override the TOML file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub text_analyzer_url: Option<String>,
    pub image_analyzer_url: Option<String>,
    pub assistant_url: Option<String>,
}

impl TriageConfig {
    /// Resolve, load, override and validate the configuration
    pub fn load(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let location = resolve_config_location(config_path, CONFIG_ENV_VAR, MODULE_NAME);
        let mut config: TriageConfig = load_toml_config(&location)?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(port) = overrides.port {
            info!(port, "Port overridden");
            self.port = port;
        }
        if let Some(url) = &overrides.text_analyzer_url {
            info!(url = %url, "Text analyzer URL overridden");
            self.analyzers.text_url = url.clone();
        }
        if let Some(url) = &overrides.image_analyzer_url {
            info!(url = %url, "Image analyzer URL overridden");
            self.analyzers.image_url = url.clone();
        }
        if let Some(url) = &overrides.assistant_url {
            info!(url = %url, "Assistant URL overridden");
            self.assistant.url = url.clone();
        }
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<()> {
        self.fusion
            .validate()
            .map_err(|e| Error::Config(format!("Invalid [fusion] section: {}", e)))?;

        if self.analyzers.timeout_ms == 0 {
            return Err(Error::Config("analyzers.timeout_ms must be positive".to_string()));
        }
        if self.assistant.timeout_ms == 0 {
            return Err(Error::Config("assistant.timeout_ms must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setu_common::config::parse_toml_config;

    #[test]
    fn test_defaults() {
        let config = TriageConfig::default();
        assert_eq!(config.port, 5780);
        assert_eq!(config.analyzers.timeout(), Duration::from_secs(3));
        assert_eq!(config.assistant.model, "aapda-assistant");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_equals_defaults() {
        let config: TriageConfig = parse_toml_config("").unwrap();
        assert_eq!(config, TriageConfig::default());
    }

    #[test]
    fn test_full_file() {
        let config: TriageConfig = parse_toml_config(
            r#"
            bind_address = "127.0.0.1"
            port = 6000

            [logging]
            level = "debug"

            [analyzers]
            text_url = "http://text:9000"
            image_url = ""
            timeout_ms = 1500

            [fusion.weights]
            text = 0.4
            image = 0.4
            metadata = 0.2

            [fusion.thresholds]
            verify_below = 0.65

            [assistant]
            model = "llama3"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.analyzers.text_endpoint(), Some("http://text:9000"));
        assert_eq!(config.analyzers.image_endpoint(), None);
        assert_eq!(config.analyzers.probe_timeout_ms, 2000);
        assert_eq!(config.fusion.weights.text, 0.4);
        assert_eq!(config.fusion.thresholds.verify_below, 0.65);
        assert_eq!(config.fusion.thresholds.high_priority, 0.8);
        assert_eq!(config.assistant.model, "llama3");
        assert_eq!(config.assistant.endpoint(), Some("http://127.0.0.1:11434"));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = TriageConfig::default();
        config.apply_overrides(&ConfigOverrides {
            port: Some(7000),
            text_analyzer_url: Some("http://override:1".to_string()),
            image_analyzer_url: None,
            assistant_url: Some(String::new()),
        });

        assert_eq!(config.port, 7000);
        assert_eq!(config.analyzers.text_url, "http://override:1");
        assert_eq!(config.analyzers.image_url, "http://127.0.0.1:8001");
        assert_eq!(config.assistant.endpoint(), None);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let config: TriageConfig =
            parse_toml_config("[fusion.weights]\ntext = 0.9\nimage = 0.9\nmetadata = 0.2\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fusion"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config: TriageConfig = parse_toml_config("[analyzers]\ntimeout_ms = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
