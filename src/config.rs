//! Runtime configuration for the board surfaces.
//!
//! Settings come from JSON or from `SVB_*` environment variables. Every
//! value has a default tuned for an unattended shop-floor screen, so an
//! empty environment yields a working configuration.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page sizes the board offers.
pub const ALLOWED_PAGE_SIZES: [usize; 4] = [3, 5, 7, 10];

const DEFAULT_PAGE_SIZE: usize = 5;
const DEFAULT_ROTATION_INTERVAL_MS: u32 = 20_000;
const DEFAULT_ROTATION_PAUSE_MS: u32 = 5_000;
const DEFAULT_RECONNECT_DELAY_MS: u32 = 10_000;
const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 6;
const DEFAULT_POLL_INTERVAL_MS: u32 = 60_000;
const DEFAULT_TICK_INTERVAL_MS: u32 = 1_000;
const DEFAULT_MAX_JOBS_SHOWN: usize = 50;
const DEFAULT_COMPLETED_VISIBILITY_DAYS: u32 = 7;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable held something other than a non-negative integer.
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// A value parsed but is not usable.
    #[error("{key} {reason}")]
    OutOfRange {
        /// Setting name.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The JSON document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timing and layout settings for the TV display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Jobs per page.
    pub page_size: usize,
    /// Time each page stays on screen.
    pub rotation_interval_ms: u32,
    /// Rotation hold after a change or manual navigation.
    pub rotation_pause_ms: u32,
    /// Fixed delay before a resubscription attempt.
    pub reconnect_delay_ms: u32,
    /// Failed subscriptions tolerated before giving up on push updates.
    pub max_reconnect_attempts: u32,
    /// Fallback polling period while push updates are unavailable.
    pub poll_interval_ms: u32,
    /// Resolution of the runtime clock tick.
    pub tick_interval_ms: u32,
    /// Upper bound on jobs kept in the rotation.
    pub max_jobs_shown: usize,
    /// Days a completed job remains visible.
    pub completed_visibility_days: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            rotation_interval_ms: DEFAULT_ROTATION_INTERVAL_MS,
            rotation_pause_ms: DEFAULT_ROTATION_PAUSE_MS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_jobs_shown: DEFAULT_MAX_JOBS_SHOWN,
            completed_visibility_days: DEFAULT_COMPLETED_VISIBILITY_DAYS,
        }
    }
}

impl DisplaySettings {
    /// Time each page stays on screen.
    #[must_use]
    pub fn rotation_interval(&self) -> TimeDelta {
        millis(self.rotation_interval_ms)
    }

    /// Rotation hold window.
    #[must_use]
    pub fn rotation_pause(&self) -> TimeDelta {
        millis(self.rotation_pause_ms)
    }

    /// Delay before a resubscription attempt.
    #[must_use]
    pub fn reconnect_delay(&self) -> TimeDelta {
        millis(self.reconnect_delay_ms)
    }

    /// Fallback polling period.
    #[must_use]
    pub fn poll_interval(&self) -> TimeDelta {
        millis(self.poll_interval_ms)
    }

    /// Runtime tick period.
    #[must_use]
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(u64::from(self.tick_interval_ms))
    }

    /// Age after which completed jobs leave the board.
    #[must_use]
    pub fn completed_visibility(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.completed_visibility_days))
    }

    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ALLOWED_PAGE_SIZES.contains(&self.page_size) {
            return Err(ConfigError::OutOfRange {
                key: "page_size",
                reason: "must be one of 3, 5, 7 or 10",
            });
        }
        let positive = [
            ("rotation_interval_ms", self.rotation_interval_ms),
            ("reconnect_delay_ms", self.reconnect_delay_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("tick_interval_ms", self.tick_interval_ms),
        ];
        if let Some((key, _)) = positive.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::OutOfRange {
                key,
                reason: "must be greater than zero",
            });
        }
        if self.max_jobs_shown == 0 {
            return Err(ConfigError::OutOfRange {
                key: "max_jobs_shown",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

fn millis(value: u32) -> TimeDelta {
    TimeDelta::milliseconds(i64::from(value))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvbConfig {
    /// TV display settings.
    pub display: DisplaySettings,
    /// `PostgreSQL` connection string, when a database backs the store.
    pub database_url: Option<String>,
}

impl SvbConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed or a setting is
    /// out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed or a setting is
    /// out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut display = DisplaySettings::default();
        if let Some(value) = read(&lookup, "SVB_PAGE_SIZE")? {
            display.page_size = value;
        }
        if let Some(value) = read(&lookup, "SVB_ROTATION_INTERVAL_MS")? {
            display.rotation_interval_ms = value;
        }
        if let Some(value) = read(&lookup, "SVB_ROTATION_PAUSE_MS")? {
            display.rotation_pause_ms = value;
        }
        if let Some(value) = read(&lookup, "SVB_RECONNECT_DELAY_MS")? {
            display.reconnect_delay_ms = value;
        }
        if let Some(value) = read(&lookup, "SVB_MAX_RECONNECT_ATTEMPTS")? {
            display.max_reconnect_attempts = value;
        }
        if let Some(value) = read(&lookup, "SVB_POLL_INTERVAL_MS")? {
            display.poll_interval_ms = value;
        }
        if let Some(value) = read(&lookup, "SVB_TICK_INTERVAL_MS")? {
            display.tick_interval_ms = value;
        }
        if let Some(value) = read(&lookup, "SVB_MAX_JOBS_SHOWN")? {
            display.max_jobs_shown = value;
        }
        if let Some(value) = read(&lookup, "SVB_COMPLETED_VISIBILITY_DAYS")? {
            display.completed_visibility_days = value;
        }
        display.validate()?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        Ok(Self {
            display,
            database_url,
        })
    }

    /// Parses a JSON document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed documents and
    /// [`ConfigError::OutOfRange`] for unusable values.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.display.validate()?;
        Ok(config)
    }
}

fn read<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
}
