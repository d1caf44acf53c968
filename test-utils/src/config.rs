//! Configuration for polling operations
//!
//! A [`PollConfig`] is fixed for the lifetime of one polling operation. The
//! interval can be overridden from the environment so slow CI machines can
//! poll less aggressively without touching test code.

use std::time::Duration;

use crate::error::{PollError, Result};

/// Environment variable read by [`PollConfig::from_env`], in milliseconds
pub const INTERVAL_ENV_VAR: &str = "TEST_UTILS_POLL_INTERVAL_MS";

/// Configuration for a polling operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between a non-success report and the next probe invocation.
    /// Zero retries on the next scheduler tick.
    /// Default: 100 milliseconds
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

impl PollConfig {
    /// Create a new PollConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight polling for probes that flip quickly, e.g. in-process state
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_millis(10),
        }
    }

    /// Relaxed polling for shared or overloaded CI runners
    pub fn ci() -> Self {
        Self {
            interval: Duration::from_millis(250),
        }
    }

    /// Build the default config, honoring `TEST_UTILS_POLL_INTERVAL_MS` if set
    pub fn from_env() -> Result<Self> {
        Self::from_env_value(std::env::var(INTERVAL_ENV_VAR).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Result<Self> {
        let Some(raw) = value else {
            return Ok(Self::default());
        };

        let millis = raw.trim().parse::<u64>().map_err(|e| {
            PollError::Configuration(format!(
                "{INTERVAL_ENV_VAR} must be a whole number of milliseconds, got {raw:?}: {e}"
            ))
        })?;

        Ok(Self::default().with_interval_ms(millis))
    }

    /// Set the delay between attempts
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the delay between attempts in milliseconds
    pub fn with_interval_ms(self, millis: u64) -> Self {
        self.with_interval(Duration::from_millis(millis))
    }
}

impl From<Duration> for PollConfig {
    fn from(interval: Duration) -> Self {
        Self { interval }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_millis(100));
        assert_eq!(config, PollConfig::new());
    }

    #[test]
    fn test_config_presets() {
        assert_eq!(PollConfig::fast().interval, Duration::from_millis(10));
        assert_eq!(PollConfig::ci().interval, Duration::from_millis(250));
    }

    #[test]
    fn test_builder_pattern() {
        let config = PollConfig::new().with_interval_ms(40);
        assert_eq!(config.interval, Duration::from_millis(40));

        let config = PollConfig::new().with_interval(Duration::ZERO);
        assert_eq!(config.interval, Duration::ZERO);

        let config: PollConfig = Duration::from_secs(1).into();
        assert_eq!(config.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_env_value_unset_uses_default() {
        let config = PollConfig::from_env_value(None).unwrap();
        assert_eq!(config, PollConfig::default());
    }

    #[test]
    fn test_env_value_parsed() {
        let config = PollConfig::from_env_value(Some(" 500 ")).unwrap();
        assert_eq!(config.interval, Duration::from_millis(500));

        let config = PollConfig::from_env_value(Some("0")).unwrap();
        assert_eq!(config.interval, Duration::ZERO);
    }

    #[test]
    fn test_env_value_rejected() {
        for bad in ["", "fast", "-5", "1.5"] {
            let err = PollConfig::from_env_value(Some(bad)).unwrap_err();
            match err {
                PollError::Configuration(msg) => assert!(msg.contains(INTERVAL_ENV_VAR)),
                other => panic!("Expected Configuration error, got {other:?}"),
            }
        }
    }
}
