//! TOML Configuration File Support
//!
//! Loads motion configuration from `~/.config/reachy-motion/motion.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/reachy-motion/motion.toml` (typically
//!   `~/.config/reachy-motion/motion.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [device]
//! queue_capacity = 16
//! command_timeout_ms = 0     # 0 = wait for the device indefinitely
//! simulate_latency = true
//!
//! [motion]
//! default_head_duration_secs = 0.5
//! default_antenna_duration_secs = 0.3
//! busy_policy = "queue"      # or "interrupt"
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::AdapterConfig;
use crate::safety;

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
    /// Value from command-line argument
    Cli,
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
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Busy Policy
// =============================================================================

/// What a new command does while another one is still moving the robot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Wait for the running command to finish
    #[default]
    Queue,
    /// Stop the running command after its current step, then run
    Interrupt,
}

impl FromStr for BusyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "interrupt" => Ok(Self::Interrupt),
            other => Err(ConfigError::ValidationError(format!(
                "busy_policy must be \"queue\" or \"interrupt\", got \"{other}\""
            ))),
        }
    }
}

impl std::fmt::Display for BusyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queue => write!(f, "queue"),
            Self::Interrupt => write!(f, "interrupt"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Device section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceToml {
    /// Requests that may queue for the actuator worker
    pub queue_capacity: Option<usize>,

    /// Extra time to wait for a device call past its duration (0 = no timeout)
    pub command_timeout_ms: Option<u64>,

    /// Whether the simulated device blocks for each move's duration
    pub simulate_latency: Option<bool>,
}

/// Motion section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionToml {
    /// Head move duration when the caller gives none
    pub default_head_duration_secs: Option<f32>,

    /// Antenna move duration when the caller gives none
    pub default_antenna_duration_secs: Option<f32>,

    /// "queue" or "interrupt"
    pub busy_policy: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfigToml {
    /// Device configuration section
    pub device: DeviceToml,

    /// Motion configuration section
    pub motion: MotionToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Controller defaults derived from the configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSettings {
    /// Head move duration when the caller gives none
    pub head_duration: Duration,
    /// Antenna move duration when the caller gives none
    pub antenna_duration: Duration,
    /// Behaviour when a command arrives during another one
    pub busy_policy: BusyPolicy,
}

impl Default for MotionSettings {
    fn default() -> Self {
        MotionConfigFile::default().settings()
    }
}

/// Centralized motion configuration
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct MotionConfigFile {
    /// Requests that may queue for the actuator worker
    pub queue_capacity: usize,

    /// Extra time to wait for a device call past its duration
    pub command_timeout: Option<Duration>,

    /// Whether the simulated device blocks for each move's duration
    pub simulate_latency: bool,

    /// Head move duration when the caller gives none (seconds)
    pub default_head_duration_secs: f32,

    /// Antenna move duration when the caller gives none (seconds)
    pub default_antenna_duration_secs: f32,

    /// Behaviour when a command arrives during another one
    pub busy_policy: BusyPolicy,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for MotionConfigFile {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            command_timeout: None,
            simulate_latency: true,
            default_head_duration_secs: 0.5,
            default_antenna_duration_secs: 0.3,
            busy_policy: BusyPolicy::Queue,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl MotionConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Settings for the device adapter
    #[must_use]
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            queue_capacity: self.queue_capacity,
            settle_timeout: self.command_timeout,
        }
    }

    /// Settings for the motion controller
    ///
    /// Default durations are saturated to the allowed move range.
    #[must_use]
    pub fn settings(&self) -> MotionSettings {
        MotionSettings {
            head_duration: safety::move_duration(self.default_head_duration_secs),
            antenna_duration: safety::move_duration(self.default_antenna_duration_secs),
            busy_policy: self.busy_policy,
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/reachy-motion/motion.toml` or
/// `~/.config/reachy-motion/motion.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("reachy-motion").join("motion.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed or holds
/// invalid values. A missing config file is not an error.
pub fn load_config() -> Result<MotionConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// Environment variables override values from the file.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read, parsed or
/// validated.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<MotionConfigFile, ConfigError> {
    let mut config = load_config_file(path)?;
    apply_env_config(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Load defaults and the config file only, without environment overrides
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read, parsed or
/// validated.
pub fn load_config_file(path: Option<PathBuf>) -> Result<MotionConfigFile, ConfigError> {
    let mut config = MotionConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: MotionConfigToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    Ok(config)
}

fn positive_secs(key: &str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::ValidationError(format!(
            "{key} must be a positive number of seconds, got {value}"
        )))
    }
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(
    config: &mut MotionConfigFile,
    toml: &MotionConfigToml,
) -> Result<(), ConfigError> {
    // Device settings
    if let Some(capacity) = toml.device.queue_capacity {
        if capacity == 0 {
            return Err(ConfigError::ValidationError(
                "device.queue_capacity must be at least 1".to_string(),
            ));
        }
        config.queue_capacity = capacity;
    }
    if let Some(ms) = toml.device.command_timeout_ms {
        config.command_timeout = timeout_from_ms(ms);
    }
    if let Some(simulate) = toml.device.simulate_latency {
        config.simulate_latency = simulate;
    }

    // Motion settings
    if let Some(secs) = toml.motion.default_head_duration_secs {
        config.default_head_duration_secs =
            positive_secs("motion.default_head_duration_secs", secs)?;
    }
    if let Some(secs) = toml.motion.default_antenna_duration_secs {
        config.default_antenna_duration_secs =
            positive_secs("motion.default_antenna_duration_secs", secs)?;
    }
    if let Some(ref policy) = toml.motion.busy_policy {
        config.busy_policy = policy.parse()?;
    }

    Ok(())
}

fn timeout_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Apply environment variable overrides to the config
///
/// Unparseable values are ignored with a warning.
fn apply_env_config(config: &mut MotionConfigFile, var: impl Fn(&str) -> Option<String>) {
    if let Some(capacity) = var("MOTION_QUEUE_CAPACITY") {
        match capacity.parse::<usize>() {
            Ok(n) if n > 0 => {
                config.queue_capacity = n;
                config.source = ConfigSource::Env;
            }
            _ => tracing::warn!(value = %capacity, "Ignoring invalid MOTION_QUEUE_CAPACITY"),
        }
    }
    if let Some(timeout) = var("MOTION_COMMAND_TIMEOUT_MS") {
        match timeout.parse::<u64>() {
            Ok(ms) => {
                config.command_timeout = timeout_from_ms(ms);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid MOTION_COMMAND_TIMEOUT_MS"),
        }
    }
    if let Some(simulate) = var("MOTION_SIMULATE_LATENCY") {
        config.simulate_latency = simulate != "0" && simulate.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
    if let Some(policy) = var("MOTION_BUSY_POLICY") {
        match policy.parse::<BusyPolicy>() {
            Ok(policy) => {
                config.busy_policy = policy;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring invalid MOTION_BUSY_POLICY"),
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Simulated latency override
    pub simulate_latency: Option<bool>,

    /// Busy policy override
    pub busy_policy: Option<BusyPolicy>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set simulated latency override
    #[must_use]
    pub fn with_simulate_latency(mut self, enabled: bool) -> Self {
        self.simulate_latency = Some(enabled);
        self
    }

    /// Set busy policy override
    #[must_use]
    pub fn with_busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.busy_policy = Some(policy);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut MotionConfigFile) {
        if self.simulate_latency.is_some() || self.busy_policy.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(enabled) = self.simulate_latency {
            config.simulate_latency = enabled;
        }
        if let Some(policy) = self.busy_policy {
            config.busy_policy = policy;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
