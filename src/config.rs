//! Configuration for the trace agent.

use crate::core::pipeline::TrackingTarget;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Main configuration for the trace agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding exported clustering collections
    pub source_path: PathBuf,

    /// Path for exporting tracking reports
    pub export_path: PathBuf,

    /// Path for storing run statistics
    pub data_path: PathBuf,

    /// Tracing filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Monitored channels
    #[serde(default)]
    pub targets: Vec<TrackingTarget>,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shm-trace-agent");

        Self {
            source_path: data_dir.join("source"),
            export_path: data_dir.join("reports"),
            data_path: data_dir,
            log_filter: default_log_filter(),
            targets: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;

        for target in &config.targets {
            target
                .validate()
                .map_err(|e| ConfigError::InvalidTarget(target.name.clone(), e.to_string()))?;
        }

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shm-trace-agent")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Find a configured target by name.
    pub fn target(&self, name: &str) -> Option<&TrackingTarget> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Path of the persisted run statistics.
    pub fn run_stats_path(&self) -> PathBuf {
        self.data_path.join("run_stats.json")
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Invalid target '{0}': {1}")]
    InvalidTarget(String, String),
}
