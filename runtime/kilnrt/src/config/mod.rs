//! Runtime configuration.

use kiln_rc::{PoolConfig, POOL_BLOCK_SIZE};

/// Environment variable overriding [`RuntimeConfig::pool_block_size`].
pub const POOL_BLOCK_SIZE_VAR: &str = "KILN_POOL_BLOCK_SIZE";

/// Environment variable overriding [`RuntimeConfig::track_proxies`].
pub const TRACK_PROXIES_VAR: &str = "KILN_TRACK_PROXIES";

/// Runtime construction options, shared by both proxy pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Proxies per pool block.
    pub pool_block_size: usize,
    /// Keep the diagnostic set of live proxies.
    pub track_proxies: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got `{value}`")]
    InvalidBlockSize { var: &'static str, value: String },

    #[error("{var} must be one of 1/0/true/false/on/off, got `{value}`")]
    InvalidFlag { var: &'static str, value: String },
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pool_block_size: POOL_BLOCK_SIZE,
            track_proxies: cfg!(debug_assertions),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `KILN_POOL_BLOCK_SIZE` and `KILN_TRACK_PROXIES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(POOL_BLOCK_SIZE_VAR) {
            config.pool_block_size = match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::InvalidBlockSize {
                        var: POOL_BLOCK_SIZE_VAR,
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup(TRACK_PROXIES_VAR) {
            config.track_proxies = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidFlag {
                        var: TRACK_PROXIES_VAR,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            block_size: self.pool_block_size,
            track_active: self.track_proxies,
        }
    }
}
