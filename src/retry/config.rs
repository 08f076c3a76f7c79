//! Retry configuration.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::blocking::Retry;
use super::classify::RetryOn;
use super::error::ConfigError;
#[cfg(feature = "async")]
use super::suspending::AsyncRetry;

const DEFAULT_TRIES: NonZeroU32 = match NonZeroU32::new(5) {
    Some(tries) => tries,
    None => unreachable!(),
};

/// How a wrapped operation is retried.
///
/// A configuration is pure data: it describes the retry behavior but doesn't
/// execute anything. Bind it to an operation with [`RetryConfig::bind`] (blocking
/// operations) or [`RetryConfig::bind_async`] (async operations). The binding
/// keeps the configuration behind an `Arc` and never mutates it; every call
/// starts from attempt one with the configured initial delay.
///
/// | setting    | default          |
/// |------------|------------------|
/// | `tries`    | 5                |
/// | `delay`    | 0                |
/// | `backoff`  | 1.0              |
/// | `retry_on` | [`RetryOn::any`] |
///
/// # Examples
///
/// ```rust
/// use repeater::{RetryConfig, RetryOn};
/// use std::io;
/// use std::time::Duration;
///
/// let config = RetryConfig::<io::Error>::builder()
///     .tries(3)
///     .delay(Duration::from_millis(500))
///     .backoff(2.0)
///     .retry_on(RetryOn::kind(io::ErrorKind::ConnectionRefused))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.tries(), 3);
/// assert_eq!(config.delay(), Duration::from_millis(500));
/// assert_eq!(config.backoff(), 2.0);
/// ```
pub struct RetryConfig<E> {
    pub(crate) tries: NonZeroU32,
    pub(crate) delay: Duration,
    pub(crate) backoff: f64,
    pub(crate) retry_on: RetryOn<E>,
    pub(crate) on_retry: Option<RetryHook<E>>,
}

type RetryHook<E> = Arc<dyn Fn(&RetryEvent<'_, E>) + Send + Sync>;

/// Information about a retryable failure, passed to hooks.
///
/// Hooks see every retryable failure, including the final one. Failures
/// rejected by the [`RetryOn`] filter never reach a hook.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// Total attempts allowed.
    pub tries: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before the next attempt, or `None` when attempts are exhausted.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since the first attempt.
    pub elapsed: Duration,
}

impl<'a, E> RetryEvent<'a, E> {
    /// Returns true if this was the last allowed attempt.
    pub fn is_exhausted(&self) -> bool {
        self.next_delay.is_none()
    }
}

impl<E> RetryConfig<E> {
    /// Create a configuration with every default.
    pub fn new() -> Self {
        Self {
            tries: DEFAULT_TRIES,
            delay: Duration::ZERO,
            backoff: 1.0,
            retry_on: RetryOn::any(),
            on_retry: None,
        }
    }

    /// Start building a configuration.
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    /// Total attempts, first attempt included.
    pub fn tries(&self) -> u32 {
        self.tries.get()
    }

    /// Wait before the second attempt.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Multiplier applied to the delay after each retried failure.
    pub fn backoff(&self) -> f64 {
        self.backoff
    }

    /// The failure filter.
    pub fn retry_on(&self) -> &RetryOn<E> {
        &self.retry_on
    }

    /// Replace the failure filter.
    ///
    /// Useful when the numeric settings come from data (see `RetrySettings`
    /// behind the `serde` feature) and the filter from code.
    pub fn with_retry_on(mut self, retry_on: RetryOn<E>) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Returns true if `error` is eligible for another attempt.
    pub fn is_retryable(&self, error: &E) -> bool {
        self.retry_on.matches(error)
    }

    /// Bind this configuration to a blocking operation.
    ///
    /// ```rust
    /// use repeater::RetryConfig;
    ///
    /// let parse = RetryConfig::default().bind(|input: &str| input.parse::<i32>());
    ///
    /// assert_eq!(parse.call("42"), Ok(42));
    /// assert!(parse.call("forty-two").is_err());
    /// ```
    pub fn bind<F>(self, operation: F) -> Retry<F, E> {
        Retry::with_config(operation, self)
    }

    /// Bind this configuration to an async operation.
    ///
    /// ```rust
    /// use repeater::RetryConfig;
    ///
    /// # tokio_test::block_on(async {
    /// let double = RetryConfig::<String>::default()
    ///     .bind_async(|n: u32| async move { Ok::<_, String>(n * 2) });
    ///
    /// assert_eq!(double.call(21).await, Ok(42));
    /// # });
    /// ```
    #[cfg(feature = "async")]
    pub fn bind_async<F>(self, operation: F) -> AsyncRetry<F, E> {
        AsyncRetry::with_config(operation, self)
    }

    pub(crate) fn notify(&self, event: &RetryEvent<'_, E>) {
        if let Some(hook) = &self.on_retry {
            hook(event);
        }
    }
}

impl<E> Default for RetryConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        Self {
            tries: self.tries,
            delay: self.delay,
            backoff: self.backoff,
            retry_on: self.retry_on.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("tries", &self.tries)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("retry_on", &self.retry_on)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Builder for [`RetryConfig`].
///
/// Values are validated by [`RetryConfigBuilder::build`].
pub struct RetryConfigBuilder<E> {
    tries: u32,
    delay: Duration,
    invalid_delay: Option<f64>,
    backoff: f64,
    retry_on: RetryOn<E>,
    on_retry: Option<RetryHook<E>>,
}

impl<E> RetryConfigBuilder<E> {
    fn new() -> Self {
        Self {
            tries: DEFAULT_TRIES.get(),
            delay: Duration::ZERO,
            invalid_delay: None,
            backoff: 1.0,
            retry_on: RetryOn::any(),
            on_retry: None,
        }
    }

    /// Total attempts, first attempt included. Must be at least 1.
    pub fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// Wait before the second attempt.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self.invalid_delay = None;
        self
    }

    /// Wait before the second attempt, in seconds.
    ///
    /// Negative or non-finite values are reported by `build`.
    pub fn delay_secs(mut self, secs: f64) -> Self {
        match Duration::try_from_secs_f64(secs) {
            Ok(delay) => {
                self.delay = delay;
                self.invalid_delay = None;
            }
            Err(_) => self.invalid_delay = Some(secs),
        }
        self
    }

    /// Multiplier applied to the delay after each retried failure.
    ///
    /// `1.0` keeps the delay constant, `2.0` doubles it, `0.0` drops it to
    /// zero after the first retry.
    pub fn backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    /// Which failures are retryable.
    pub fn retry_on(mut self, retry_on: RetryOn<E>) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Register a hook called for every retryable failure.
    ///
    /// The hook runs before the delay. It is synchronous and should not
    /// block; use it for metrics or custom logging.
    ///
    /// ```rust
    /// use repeater::RetryConfig;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::sync::Arc;
    ///
    /// let seen = Arc::new(AtomicU32::new(0));
    /// let config = RetryConfig::<String>::builder()
    ///     .tries(3)
    ///     .on_retry({
    ///         let seen = Arc::clone(&seen);
    ///         move |_event| {
    ///             seen.fetch_add(1, Ordering::SeqCst);
    ///         }
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// let always_fails = config.bind(|()| Err::<(), _>("down".to_string()));
    /// assert!(always_fails.call(()).is_err());
    /// assert_eq!(seen.load(Ordering::SeqCst), 3);
    /// ```
    pub fn on_retry<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, E>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<RetryConfig<E>, ConfigError> {
        let tries = NonZeroU32::new(self.tries).ok_or(ConfigError::ZeroTries)?;

        if let Some(secs) = self.invalid_delay {
            return Err(ConfigError::InvalidDelay(secs));
        }

        if !self.backoff.is_finite() || self.backoff < 0.0 {
            return Err(ConfigError::InvalidBackoff(self.backoff));
        }

        Ok(RetryConfig {
            tries,
            delay: self.delay,
            backoff: self.backoff,
            retry_on: self.retry_on,
            on_retry: self.on_retry,
        })
    }
}

impl<E> fmt::Debug for RetryConfigBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfigBuilder")
            .field("tries", &self.tries)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("retry_on", &self.retry_on)
            .finish_non_exhaustive()
    }
}
