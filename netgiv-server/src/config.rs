//! Configuration loading for netgiv-server.
//!
//! Configuration is loaded from a TOML file (default: `netgiv-server.toml`).
//! Every section and field is optional except the auth token.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for netgiv-server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Timeouts and transfer sizes.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration.
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    /// TCP bind address (default: 0.0.0.0:4512).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Shared secret every client must present. Required.
    #[serde(default)]
    pub auth_token: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// Timeouts and transfer sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Deadline for the key exchange and for each awaited message (default: 5).
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
    /// Bytes per ReceiveDataNext chunk (default: 2048).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for object files (default: the OS temp dir).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Largest object a client may send, in bytes (default and cap: u32::MAX).
    #[serde(default = "default_max_object_size")]
    pub max_object_size: u64,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:4512".to_string()
}

fn default_io_timeout_secs() -> u64 {
    5
}

fn default_chunk_size() -> usize {
    2048
}

fn default_max_object_size() -> u64 {
    u32::MAX as u64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            auth_token: String::new(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            io_timeout_secs: default_io_timeout_secs(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            max_object_size: default_max_object_size(),
        }
    }
}

impl LimitsConfig {
    /// The I/O deadline as a Duration.
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

impl StorageConfig {
    /// Object size limit, never above what the wire's u32 size can carry.
    pub fn object_size_limit(&self) -> u64 {
        self.max_object_size.min(u32::MAX as u64)
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or is invalid.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with the given auth token.
    pub fn with_auth_token(token: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.server.auth_token = token.into();
        config
    }

    /// Check values that have no sensible default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.auth_token.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "server.auth_token must be set".into(),
            });
        }
        if self.limits.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                reason: "limits.chunk_size must be greater than zero".into(),
            });
        }
        if self.limits.io_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "limits.io_timeout_secs must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is missing or out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}
