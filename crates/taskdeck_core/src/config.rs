//! Core runtime configuration.
//!
//! # Responsibility
//! - Hold tunables shared by services, the refresh loop and logging.
//! - Parse and validate configuration supplied by the embedding shell.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - A config returned by [`CoreConfig::from_json_str`] has passed
//!   [`CoreConfig::validate`].

use crate::logging::{default_log_level, normalize_level};
use crate::stats::aggregate::RECENT_ACTIVITY_LIMIT;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Tunables for one core instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Dashboard recomputation period in seconds.
    pub refresh_interval_secs: u64,
    /// Maximum entries in the recent-activity feed.
    pub recent_activity_limit: usize,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            recent_activity_limit: RECENT_ACTIVITY_LIMIT,
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Parses a JSON object and validates it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        if self.recent_activity_limit == 0 {
            return Err(ConfigError::ZeroActivityLimit);
        }
        normalize_level(&self.log_level)
            .map_err(|err| ConfigError::InvalidLogLevel(err.to_string()))?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    ZeroRefreshInterval,
    ZeroActivityLimit,
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid config: {message}"),
            Self::ZeroRefreshInterval => write!(f, "refresh_interval_secs must be > 0"),
            Self::ZeroActivityLimit => write!(f, "recent_activity_limit must be > 0"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::time::Duration;

    #[test]
    fn empty_object_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty object should be valid");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.recent_activity_limit, 5);
    }

    #[test]
    fn rejects_zero_interval_and_bad_level() {
        let err = CoreConfig::from_json_str(r#"{"refresh_interval_secs": 0}"#)
            .expect_err("zero interval should be rejected");
        assert_eq!(err, ConfigError::ZeroRefreshInterval);

        let err = CoreConfig::from_json_str(r#"{"log_level": "loud"}"#)
            .expect_err("unknown level should be rejected");
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = CoreConfig::from_json_str(r#"{"max_tags": 5}"#)
            .expect_err("unknown fields should be rejected");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
