//! TOML Configuration File Support
//!
//! This module provides centralized configuration loading for pipecraft,
//! supporting a TOML configuration file at `~/.config/pipecraft/core.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # XDG Base Directory Compliance
//!
//! The configuration file follows XDG Base Directory specification:
//! - `$XDG_CONFIG_HOME/pipecraft/core.toml` (typically `~/.config/pipecraft/core.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [agent]
//! base_url = "http://localhost:8080"
//! connect_timeout_ms = 5000
//! request_timeout_ms = 120000
//!
//! [streaming]
//! channel_capacity = 100
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Agent section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentToml {
    /// Base URL of the agent service
    pub base_url: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,

    /// Whole-request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
}

/// Streaming section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingToml {
    /// Bounded capacity of the stream signal channel
    pub channel_capacity: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipecraftToml {
    /// Agent service configuration section
    pub agent: AgentToml,

    /// Streaming configuration section
    pub streaming: StreamingToml,
}

// =============================================================================
// Resolved Configuration Structs
// =============================================================================

/// Resolved agent service settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    /// Base URL of the agent service
    pub base_url: String,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Whole-request timeout (covers the full streamed response)
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout: Duration::from_millis(5000),
            request_timeout: Duration::from_millis(120_000),
        }
    }
}

/// Resolved streaming settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamingConfig {
    /// Bounded capacity of the stream signal channel
    pub channel_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
        }
    }
}

/// Centralized configuration for pipecraft
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipecraftConfig {
    /// Agent service configuration
    pub agent: AgentConfig,

    /// Streaming configuration
    pub streaming: StreamingConfig,
}

impl PipecraftConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty base URL or a
    /// zero channel capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.base_url must not be empty".to_string(),
            ));
        }
        if self.streaming.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "streaming.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/pipecraft/core.toml` or
/// `~/.config/pipecraft/core.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pipecraft").join("core.toml"))
}

/// Load configuration from all sources with proper priority
///
/// Priority order (highest first):
/// 1. Environment variables
/// 2. TOML configuration file
/// 3. Default values
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// resolved configuration fails validation. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<PipecraftConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only
///   defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or the resolved configuration fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<PipecraftConfig, ConfigError> {
    // Start with defaults
    let mut config = PipecraftConfig::default();
    let mut source = ConfigSource::Default;

    // Try to load from file
    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: PipecraftToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            source = ConfigSource::File;
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Apply environment variables (overrides file values)
    if apply_env_config(&mut config) {
        source = ConfigSource::Env;
    }

    config.validate()?;
    tracing::info!(%source, base_url = %config.agent.base_url, "Loaded configuration");

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut PipecraftConfig, toml: &PipecraftToml) {
    // Agent settings
    if let Some(ref url) = toml.agent.base_url {
        config.agent.base_url = url.clone();
    }
    if let Some(ms) = toml.agent.connect_timeout_ms {
        config.agent.connect_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.agent.request_timeout_ms {
        config.agent.request_timeout = Duration::from_millis(ms);
    }

    // Streaming settings
    if let Some(capacity) = toml.streaming.channel_capacity {
        config.streaming.channel_capacity = capacity;
    }
}

/// Apply environment variable overrides to the config
///
/// Returns true when at least one variable took effect.
fn apply_env_config(config: &mut PipecraftConfig) -> bool {
    let mut applied = false;

    if let Ok(url) = std::env::var("PIPECRAFT_AGENT_URL") {
        config.agent.base_url = url;
        applied = true;
    }
    if let Ok(timeout) = std::env::var("PIPECRAFT_CONNECT_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.agent.connect_timeout = Duration::from_millis(ms);
            applied = true;
        }
    }
    if let Ok(timeout) = std::env::var("PIPECRAFT_REQUEST_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.agent.request_timeout = Duration::from_millis(ms);
            applied = true;
        }
    }
    if let Ok(capacity) = std::env::var("PIPECRAFT_CHANNEL_CAPACITY") {
        if let Ok(n) = capacity.parse::<usize>() {
            config.streaming.channel_capacity = n;
            applied = true;
        }
    }

    applied
}

// =============================================================================
// Tests
// =============================================================================
