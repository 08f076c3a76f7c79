//! Error types for retry configuration.
//!
//! The retry wrappers never wrap the operation's own failures: whatever the
//! operation returns as `Err` is what the caller receives. The only error this
//! crate produces itself is [`ConfigError`], raised when a configuration is
//! built from invalid values.

use thiserror::Error;

/// Error returned when a [`RetryConfig`](super::RetryConfig) fails validation.
///
/// # Examples
///
/// ```rust
/// use repeater::{ConfigError, RetryConfig};
///
/// let err = RetryConfig::<std::io::Error>::builder()
///     .tries(0)
///     .build()
///     .unwrap_err();
///
/// assert_eq!(err, ConfigError::ZeroTries);
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `tries` must allow at least the first attempt.
    #[error("tries must be at least 1")]
    ZeroTries,

    /// The backoff multiplier was negative, NaN or infinite.
    #[error("backoff must be a finite, non-negative multiplier (got {0})")]
    InvalidBackoff(f64),

    /// A delay given in seconds was negative, NaN or infinite.
    #[error("delay must be a finite, non-negative number of seconds (got {0})")]
    InvalidDelay(f64),
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_zero_tries_display() {
        assert_eq!(ConfigError::ZeroTries.to_string(), "tries must be at least 1");
    }

    #[test]
    fn test_invalid_backoff_display() {
        let display = ConfigError::InvalidBackoff(-2.0).to_string();
        assert!(display.contains("backoff"));
        assert!(display.contains("-2"));
    }

    #[test]
    fn test_invalid_delay_display() {
        let display = ConfigError::InvalidDelay(f64::NAN).to_string();
        assert!(display.contains("delay"));
        assert!(display.contains("NaN"));
    }

    #[test]
    fn test_config_error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<ConfigError>();
    }
}
