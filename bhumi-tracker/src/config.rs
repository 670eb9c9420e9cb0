//! Tracker configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MS_PER_MINUTE: u32 = 60_000;

fn default_tick_interval_ms() -> u32 {
    100
}

fn default_max_pending() -> usize {
    32
}

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Period of the tick event in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u32,
    /// Ticks per TTL minute; derived from `tick_interval_ms` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks_per_minute: Option<u32>,
    /// Inbound events the event loop holds before dropping new ones
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            ticks_per_minute: None,
            max_pending: default_max_pending(),
        }
    }
}

impl TrackerConfig {
    pub fn ticks_per_minute(&self) -> u32 {
        self.ticks_per_minute
            .unwrap_or(MS_PER_MINUTE / self.tick_interval_ms.max(1))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be > 0"));
        }
        if self.tick_interval_ms > MS_PER_MINUTE {
            return Err(ConfigError::Invalid("tick_interval_ms must be at most one minute"));
        }
        if self.ticks_per_minute == Some(0) {
            return Err(ConfigError::Invalid("ticks_per_minute must be > 0"));
        }
        if self.max_pending == 0 {
            return Err(ConfigError::Invalid("max_pending must be > 0"));
        }
        Ok(())
    }

    /// Load config from `path`, writing `default` there first if it does not exist
    pub fn load_or_create(path: &Path, default: Self) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(&default)?)?;
            default
        };
        config.validate()?;
        Ok(config)
    }
}
