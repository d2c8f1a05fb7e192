//! CLI configuration management
//!
//! Handles loading and saving configuration from ~/.evaljobs/config.toml.
//! The access token is never stored; it always comes from `HF_TOKEN`.

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use evaljobs_application::services::{
    CollectorConfig, PipelineConfig, PublisherConfig, DEFAULT_POLL_INTERVAL,
    DEFAULT_VIEWER_TEMPLATE, DEFAULT_WAIT_GRACE,
};
use evaljobs_domain::{ExportFormat, MultiModelPolicy, RepoId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Keys accepted by `config get` / `config set`
pub const KEYS: &[&str] = &[
    "hub_endpoint",
    "viewer_template",
    "poll_interval_secs",
    "wait_grace_secs",
    "multi_model",
    "export_format",
    "output_format",
    "colored",
    "debug",
];

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Hub base URL
    #[serde(default = "default_hub_endpoint")]
    pub hub_endpoint: String,

    /// Space duplicated to create the viewer
    #[serde(default = "default_viewer_template")]
    pub viewer_template: String,

    /// Delay between two job status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Extra local wait on top of the job timeout
    #[serde(default = "default_wait_grace")]
    pub wait_grace_secs: u64,

    /// Default multi-model policy
    #[serde(default)]
    pub multi_model: MultiModelPolicy,

    /// Default tabular export
    #[serde(default)]
    pub export_format: ExportFormat,

    /// Default output format
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Enable colored output
    #[serde(default = "default_colored")]
    pub colored: bool,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

fn default_hub_endpoint() -> String {
    evaljobs_sdk::DEFAULT_ENDPOINT.to_string()
}

fn default_viewer_template() -> String {
    DEFAULT_VIEWER_TEMPLATE.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_wait_grace() -> u64 {
    DEFAULT_WAIT_GRACE.as_secs()
}

fn default_colored() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_endpoint: default_hub_endpoint(),
            viewer_template: default_viewer_template(),
            poll_interval_secs: default_poll_interval(),
            wait_grace_secs: default_wait_grace(),
            multi_model: MultiModelPolicy::default(),
            export_format: ExportFormat::default(),
            output_format: OutputFormat::default(),
            colored: default_colored(),
            debug: false,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".evaljobs"))
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_file()?)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from `path`; defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Apply `HF_ENDPOINT`, `EVALJOBS_*` and `NO_COLOR` overrides
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(endpoint) = var("HF_ENDPOINT") {
            self.hub_endpoint = endpoint;
        }
        if let Some(template) = var("EVALJOBS_VIEWER_TEMPLATE") {
            self.set_value("viewer_template", &template)?;
        }
        if let Some(interval) = var("EVALJOBS_POLL_INTERVAL") {
            self.set_value("poll_interval_secs", &interval)
                .context("Invalid EVALJOBS_POLL_INTERVAL")?;
        }
        if var("EVALJOBS_DEBUG").is_some() {
            self.debug = true;
        }
        if var("NO_COLOR").is_some() {
            self.colored = false;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    /// Save configuration to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "hub_endpoint" | "endpoint" => Some(self.hub_endpoint.clone()),
            "viewer_template" | "template" => Some(self.viewer_template.clone()),
            "poll_interval_secs" | "poll_interval" => Some(self.poll_interval_secs.to_string()),
            "wait_grace_secs" | "wait_grace" => Some(self.wait_grace_secs.to_string()),
            "multi_model" | "multi-model" => Some(self.multi_model.to_string()),
            "export_format" | "export" => Some(self.export_format.to_string()),
            "output_format" | "output-format" | "format" => Some(self.output_format.to_string()),
            "colored" | "color" => Some(self.colored.to_string()),
            "debug" => Some(self.debug.to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key, without saving
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "hub_endpoint" | "endpoint" => {
                evaljobs_sdk::ClientConfig::new()
                    .with_base_url(value)
                    .validate()?;
                self.hub_endpoint = value.to_string();
            }
            "viewer_template" | "template" => {
                value.parse::<RepoId>()?;
                self.viewer_template = value.to_string();
            }
            "poll_interval_secs" | "poll_interval" => {
                let secs: u64 = value.parse().context("Invalid number of seconds")?;
                if secs == 0 {
                    anyhow::bail!("poll interval must be at least one second");
                }
                self.poll_interval_secs = secs;
            }
            "wait_grace_secs" | "wait_grace" => {
                self.wait_grace_secs = value.parse().context("Invalid number of seconds")?;
            }
            "multi_model" | "multi-model" => {
                self.multi_model = value.parse()?;
            }
            "export_format" | "export" => {
                self.export_format = value.parse()?;
            }
            "output_format" | "output-format" | "format" => {
                self.output_format = OutputFormat::parse(value).with_context(|| {
                    format!("Invalid output format: {}. Use json, table, or plain", value)
                })?;
            }
            "colored" | "color" => {
                self.colored = value.parse().context("Invalid boolean value")?;
            }
            "debug" => {
                self.debug = value.parse().context("Invalid boolean value")?;
            }
            "token" | "hf_token" => {
                anyhow::bail!("The token is not stored in the config file; set HF_TOKEN instead")
            }
            _ => anyhow::bail!("Unknown configuration key: {} (known: {})", key, KEYS.join(", ")),
        }
        Ok(())
    }

    /// Set a configuration value by key and save
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Reset configuration to defaults and save
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::default();
        self.save()
    }

    /// Pipeline settings derived from this configuration
    pub fn pipeline_config(&self, export: ExportFormat) -> PipelineConfig {
        PipelineConfig {
            publisher: PublisherConfig {
                viewer_template: self.viewer_template.clone(),
            },
            collector: CollectorConfig {
                poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
                grace: Duration::from_secs(self.wait_grace_secs),
                export,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hub_endpoint, "https://huggingface.co");
        assert_eq!(config.viewer_template, "dvilasuero/evaljobs_docker_template");
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.output_format, OutputFormat::Table);
        assert!(config.colored);
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_value("multi_model", "per-model").unwrap();
        config.set_value("export", "jsonl").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get("multi_model"), Some("per-model".to_string()));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "poll_interval_secs = 30\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.poll_interval_secs, 30);
        assert_eq!(loaded.wait_grace_secs, 300);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HF_ENDPOINT", "https://hub.example.com"),
            ("EVALJOBS_POLL_INTERVAL", "3"),
            ("NO_COLOR", "1"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.hub_endpoint, "https://hub.example.com");
        assert_eq!(config.poll_interval_secs, 3);
        assert!(!config.colored);
        assert!(!config.debug);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        assert!(config.set_value("poll_interval", "0").is_err());
        assert!(config.set_value("multi_model", "round-robin").is_err());
        assert!(config.set_value("viewer_template", "no-slash").is_err());
        assert!(config.set_value("hub_endpoint", "not a url").is_err());
        assert!(config.set_value("token", "hf_x").is_err());
        assert!(config.set_value("unknown", "x").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_pipeline_config() {
        let mut config = Config::default();
        config.set_value("wait_grace", "60").unwrap();
        let pipeline = config.pipeline_config(ExportFormat::None);
        assert_eq!(pipeline.collector.grace, Duration::from_secs(60));
        assert_eq!(pipeline.collector.export, ExportFormat::None);
        assert_eq!(pipeline.publisher.viewer_template, DEFAULT_VIEWER_TEMPLATE);
    }
}
