//! Serializable retry settings.

use serde::{Deserialize, Serialize};

use super::config::RetryConfig;
use super::error::ConfigError;

/// The data half of a [`RetryConfig`], loadable from any serde format.
///
/// The failure filter is code, not data: attach it afterwards with
/// [`RetryConfig::with_retry_on`]. Missing fields take the configuration
/// defaults.
///
/// # Examples
///
/// ```rust
/// use repeater::{RetryOn, RetrySettings};
/// use std::io;
/// use std::time::Duration;
///
/// let settings: RetrySettings = serde_json::from_str(r#"{ "tries": 3, "delay": 0.5 }"#).unwrap();
/// let config = settings
///     .into_config::<io::Error>()
///     .unwrap()
///     .with_retry_on(RetryOn::kind(io::ErrorKind::TimedOut));
///
/// assert_eq!(config.tries(), 3);
/// assert_eq!(config.delay(), Duration::from_millis(500));
/// assert_eq!(config.backoff(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, first attempt included.
    pub tries: u32,
    /// Delay before the second attempt, in seconds.
    pub delay: f64,
    /// Multiplier applied to the delay after each retried failure.
    pub backoff: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            tries: 5,
            delay: 0.0,
            backoff: 1.0,
        }
    }
}

impl RetrySettings {
    /// Validate the settings and build a configuration that retries every failure.
    pub fn into_config<E>(self) -> Result<RetryConfig<E>, ConfigError> {
        RetryConfig::builder()
            .tries(self.tries)
            .delay_secs(self.delay)
            .backoff(self.backoff)
            .build()
    }
}

impl<E> From<&RetryConfig<E>> for RetrySettings {
    fn from(config: &RetryConfig<E>) -> Self {
        Self {
            tries: config.tries(),
            delay: config.delay().as_secs_f64(),
            backoff: config.backoff(),
        }
    }
}
