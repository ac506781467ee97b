use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Timer cadences and storage slot for a running game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Period of the economy tick in milliseconds (default: 100).
    pub tick_interval_ms: u64,
    /// Period of the autosave in milliseconds (default: 10 000).
    pub save_interval_ms: u64,
    /// Store key the save is written under.
    pub save_key: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            save_interval_ms: 10_000,
            save_key: persistence::SAVE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("{0} must be > 0")]
    ZeroInterval(&'static str),
    #[error("save interval ({save_ms} ms) is shorter than the tick interval ({tick_ms} ms)")]
    SaveFasterThanTick { save_ms: u64, tick_ms: u64 },
    #[error("save key must not be empty")]
    EmptyKey,
    #[error("save key {0:?} may only use [A-Za-z0-9_.-] and must not start with '.'")]
    InvalidKey(String),
}

impl RuntimeConfig {
    /// Read and validate a YAML config file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("tick_interval_ms"));
        }
        if self.save_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("save_interval_ms"));
        }
        if self.save_interval_ms < self.tick_interval_ms {
            return Err(ConfigError::SaveFasterThanTick {
                save_ms: self.save_interval_ms,
                tick_ms: self.tick_interval_ms,
            });
        }
        if self.save_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        if !persistence::is_valid_key(&self.save_key) {
            return Err(ConfigError::InvalidKey(self.save_key.clone()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }
}
