//! Configuration loading and typed config structures for the player.
//!
//! The canonical configuration lives in `fleetsim-config.yaml` at the
//! workspace root. This module defines strongly-typed structs that mirror
//! the YAML structure and a loader that reads and validates the file.
//! Every field has a default, so a missing file or a partial file both
//! produce a usable configuration.

use std::path::Path;

use serde::Deserialize;

use fleetsim_types::SpeedMultiplier;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configured speed factor is not one of the supported values.
    #[error("unsupported speed factor {factor}, expected 1, 5 or 10")]
    InvalidSpeed {
        /// The rejected factor.
        factor: u64,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level playback configuration.
///
/// Mirrors the structure of `fleetsim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaybackConfig {
    /// Timing and speed settings.
    #[serde(default)]
    pub playback: PlaybackSection,

    /// Event data source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlaybackConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `FLEETSIM_DATA_DIR` environment variable overrides `data.dir`,
    /// so deployments can point the player at a data set without editing
    /// the YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidSpeed`] for an unsupported speed factor.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidSpeed`] for an unsupported speed factor.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.data.apply_env_overrides();
        let _ = config.playback.speed_multiplier()?;
        Ok(config)
    }
}

/// Timing and speed settings for the playback loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaybackSection {
    /// Real-time milliseconds between ticks. Speed never changes this.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated milliseconds added per tick at 1x speed.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,

    /// Initial speed factor (1, 5 or 10).
    #[serde(default = "default_speed")]
    pub speed: u64,

    /// Whether playback starts automatically once the log is loaded.
    #[serde(default = "default_true")]
    pub autoplay: bool,
}

impl PlaybackSection {
    /// The configured speed as a validated multiplier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSpeed`] when the raw factor is not
    /// one of the supported values.
    pub fn speed_multiplier(&self) -> Result<SpeedMultiplier, ConfigError> {
        SpeedMultiplier::from_factor(self.speed)
            .ok_or(ConfigError::InvalidSpeed { factor: self.speed })
    }
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            step_ms: default_step_ms(),
            speed: default_speed(),
            autoplay: true,
        }
    }
}

/// Event data source settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataConfig {
    /// Directory holding one JSON array of raw event records per file.
    #[serde(default = "default_data_dir")]
    pub dir: String,
}

impl DataConfig {
    /// Override the data directory with `FLEETSIM_DATA_DIR` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FLEETSIM_DATA_DIR") {
            self.dir = dir;
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit a progress line every N ticks (0 = no periodic progress).
    #[serde(default = "default_progress_every_ticks")]
    pub progress_every_ticks: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            progress_every_ticks: default_progress_every_ticks(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_step_ms() -> u64 {
    1000
}

const fn default_speed() -> u64 {
    1
}

fn default_data_dir() -> String {
    "crates/fleetsim-player/data".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_progress_every_ticks() -> u64 {
    20
}

const fn default_true() -> bool {
    true
}
