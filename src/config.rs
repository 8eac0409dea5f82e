//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the pegel-config.toml
//! file. It provides a centralized way to configure the gauge endpoint, scheduling
//! thresholds, message templates, the posting account and logging.
//!
//! The file location comes from the `PEGEL_CONFIG` environment variable and falls
//! back to `pegel-config.toml` in the working directory. A missing file means
//! defaults; a file that exists but cannot be parsed or fails validation is an
//! error the caller should treat as fatal.

use crate::{
    composer::{Templates, DEFAULT_UNIT_SIZE_CM},
    history::DEFAULT_WINDOW,
    scheduler::{SchedulerPolicy, DEFAULT_TENDENCY_WEIGHT},
    slogans::PoolFiles,
};
use serde::{Deserialize, Serialize};
use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::info;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PEGEL_CONFIG";

/// Config file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "pegel-config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config format in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Application configuration loaded from pegel-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Gauge endpoint and polling cadence
    pub gauge: GaugeConfig,
    /// Threshold, cooldown and window settings
    pub scheduler: SchedulerConfig,
    /// Slogan pools and post templates
    pub messages: MessagesConfig,
    /// Posting account
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GaugeConfig {
    /// URL of the gauge XML document, required to run
    pub url: String,
    /// Sleep between two polls
    pub poll_interval_minutes: u64,
    /// Upper bound for a single gauge request
    pub request_timeout_secs: u64,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        GaugeConfig {
            url: String::new(),
            poll_interval_minutes: 60,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of readings kept in the rolling window (at least 2)
    pub window_size: usize,
    /// Window variance above which an event post goes out immediately
    pub min_change_cm: u64,
    /// Minimum time between scheduled posts
    pub cooldown_hours: u64,
    /// Share of scheduled posts that report the tendency (0.0 - 1.0)
    pub scheduled_tendency_weight: f64,
    /// Size of the unit used by unit-conversion posts
    pub unit_size_cm: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            window_size: DEFAULT_WINDOW,
            min_change_cm: 10,
            cooldown_hours: 6,
            scheduled_tendency_weight: DEFAULT_TENDENCY_WEIGHT,
            unit_size_cm: DEFAULT_UNIT_SIZE_CM,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Slogan pool files per tendency
    pub pools: PoolFiles,
    pub templates: Templates,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Status endpoint, e.g. `https://mastodon.example/api/v1/statuses`
    pub endpoint: String,
    pub access_token: String,
    /// Log posts instead of publishing them
    pub dry_run: bool,
    /// Upper bound for a single post request
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            endpoint: String::new(),
            access_token: String::new(),
            dry_run: true, // Never post from an unconfigured install
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append log lines to this file instead of stderr
    pub file: Option<PathBuf>,
    /// Default filter directive; `RUST_LOG` wins when set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: None,
            level: "info".to_string(),
        }
    }
}

/// Where a loaded [`Config`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed and validated from this file
    File(PathBuf),
    /// No file at this path, defaults in use
    Defaults(PathBuf),
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!(path = %path.display(), "loaded configuration"),
            ConfigOrigin::Defaults(path) => {
                info!(path = %path.display(), "no config file found, using defaults")
            }
        }
    }
}

impl Config {
    /// Path from `PEGEL_CONFIG`, or the default file name.
    pub fn path_from_env() -> PathBuf {
        env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from the path named by `PEGEL_CONFIG`
    pub fn load() -> Result<(Self, ConfigOrigin), ConfigError> {
        Self::load_with_origin(Self::path_from_env())
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if the file doesn't exist
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with_origin(path).map(|(config, _)| config)
    }

    /// Like [`Config::load_from_path`], also telling whether the file existed.
    ///
    /// Nothing is logged here: configuration is read before the subscriber is
    /// installed, so the caller reports the origin with [`ConfigOrigin::log`].
    pub fn load_with_origin<P: AsRef<Path>>(path: P) -> Result<(Self, ConfigOrigin), ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok((Self::default(), ConfigOrigin::Defaults(path.to_path_buf())));
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok((config, ConfigOrigin::File(path.to_path_buf())))
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scheduler;
        if s.window_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "scheduler.window_size must be at least 2, got {}",
                s.window_size
            )));
        }
        if s.cooldown_hours == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.cooldown_hours must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&s.scheduled_tendency_weight) {
            return Err(ConfigError::Invalid(format!(
                "scheduler.scheduled_tendency_weight must be within 0.0..=1.0, got {}",
                s.scheduled_tendency_weight
            )));
        }
        if s.unit_size_cm <= 0 {
            return Err(ConfigError::Invalid(format!(
                "scheduler.unit_size_cm must be positive, got {}",
                s.unit_size_cm
            )));
        }
        if self.gauge.poll_interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "gauge.poll_interval_minutes must be positive".to_string(),
            ));
        }
        if self.gauge.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "gauge.request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.dispatch.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.timeout_secs must be positive".to_string(),
            ));
        }
        if !self.dispatch.dry_run
            && (self.dispatch.endpoint.is_empty() || self.dispatch.access_token.is_empty())
        {
            return Err(ConfigError::Invalid(
                "dispatch.endpoint and dispatch.access_token are required unless dry_run is set"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn scheduler_policy(&self) -> SchedulerPolicy {
        SchedulerPolicy {
            min_change_cm: self.scheduler.min_change_cm,
            cooldown: chrono::Duration::hours(self.scheduler.cooldown_hours as i64),
            scheduled_tendency_weight: self.scheduler.scheduled_tendency_weight,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.gauge.poll_interval_minutes * 60)
    }

    pub fn gauge_timeout(&self) -> Duration {
        Duration::from_secs(self.gauge.request_timeout_secs)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch.timeout_secs)
    }
}
