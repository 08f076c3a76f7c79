//! Blocking retry wrapper.

use std::fmt;
use std::fmt::Display;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use super::config::RetryConfig;
use super::state::{AttemptState, Step};

/// A blocking operation bound to a [`RetryConfig`].
///
/// [`Retry::call`] has the same contract as the operation itself: it returns
/// the first success, or the operation's own error once the error is not
/// retryable or the attempts are used up. Delays block the calling thread.
///
/// The operation receives its argument by value on every attempt, so the
/// argument must be `Clone`. Use a tuple for several arguments and `()` for
/// none.
///
/// # Examples
///
/// ```rust
/// use repeater::{RetryConfig, RetryOn};
/// use std::cell::Cell;
/// use std::io;
///
/// let calls = Cell::new(0);
/// let connect = RetryConfig::<io::Error>::builder()
///     .tries(3)
///     .retry_on(RetryOn::kind(io::ErrorKind::ConnectionRefused))
///     .build()
///     .unwrap()
///     .bind(|port: u16| {
///         calls.set(calls.get() + 1);
///         if calls.get() < 3 {
///             Err(io::Error::from(io::ErrorKind::ConnectionRefused))
///         } else {
///             Ok(port)
///         }
///     });
///
/// assert_eq!(connect.call(8080).unwrap(), 8080);
/// assert_eq!(calls.get(), 3);
/// ```
pub struct Retry<F, E> {
    operation: F,
    config: Arc<RetryConfig<E>>,
}

impl<F, E> Retry<F, E> {
    /// Wrap `operation` with the default configuration.
    ///
    /// ```rust
    /// use repeater::Retry;
    ///
    /// let wrapped = Retry::new(|x: i32| Ok::<_, String>(x + 1));
    /// assert_eq!(wrapped.config().tries(), 5);
    /// assert_eq!(wrapped.call(1), Ok(2));
    /// ```
    pub fn new(operation: F) -> Self {
        Self::with_config(operation, RetryConfig::default())
    }

    /// Wrap `operation` with `config`.
    pub fn with_config(operation: F, config: RetryConfig<E>) -> Self {
        Self {
            operation,
            config: Arc::new(config),
        }
    }

    /// The bound configuration.
    pub fn config(&self) -> &RetryConfig<E> {
        &self.config
    }

    /// The wrapped operation.
    pub fn operation(&self) -> &F {
        &self.operation
    }

    /// Unwrap, returning the original operation.
    pub fn into_inner(self) -> F {
        self.operation
    }

    /// Invoke the operation, retrying retryable failures.
    pub fn call<A, T>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Result<T, E>,
        A: Clone,
        E: Display,
    {
        retry(&self.config, || (self.operation)(args.clone()))
    }
}

impl<F: Clone, E> Clone for Retry<F, E> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<F, E> fmt::Debug for Retry<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("operation", &std::any::type_name::<F>())
            .field("config", &self.config)
            .finish()
    }
}

/// Run `operation` under `config`, blocking the thread between attempts.
///
/// A one-shot form of [`Retry::call`] for closures that capture their inputs.
///
/// ```rust
/// use repeater::{retry, RetryConfig};
///
/// let config = RetryConfig::<String>::builder().tries(3).build().unwrap();
/// let mut attempts = 0;
///
/// let result = retry(&config, || {
///     attempts += 1;
///     if attempts < 2 {
///         Err("not yet".to_string())
///     } else {
///         Ok(attempts)
///     }
/// });
///
/// assert_eq!(result, Ok(2));
/// ```
pub fn retry<T, E, F>(config: &RetryConfig<E>, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    let start = Instant::now();
    let mut state = AttemptState::new(config);

    loop {
        let error = match operation() {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let (delay, next) = match config.on_failure(state, error, start.elapsed()) {
            Step::Retry { delay, next } => (delay, next),
            Step::Exhausted(error) | Step::Fail(error) => return Err(error),
        };

        if !delay.is_zero() {
            thread::sleep(delay);
        }
        state = next;
    }
}
