//! Runner and engine configuration files.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warsim_core::config::EngineConfig;

/// Error type for configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn read(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// How the turn runner drives producers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Time each producer gets per turn, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Stop after this many turns even if the run has not terminated.
    #[serde(default)]
    pub max_turns: Option<u32>,
}

const fn default_timeout_ms() -> u64 {
    2_000
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_turns: None,
        }
    }
}

impl RunnerConfig {
    /// Load from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_ron_str(&read(path.as_ref())?)
    }

    /// Parse from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(ron)?;
        if config.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".into()));
        }
        Ok(config)
    }

    /// Set the producer timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Cap the number of turns.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    /// The producer deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Load an [`EngineConfig`] from a RON file.
pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = ron::from_str(&read(path.as_ref())?)?;
    if config.supply_radius == 0 {
        return Err(ConfigError::Invalid("supply_radius must be at least 1".into()));
    }
    if config.intel_exposure_threshold_percent > 100 || config.degraded_readiness_threshold_percent > 100 {
        return Err(ConfigError::Invalid("percentages must not exceed 100".into()));
    }
    Ok(config)
}
