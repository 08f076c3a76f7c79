//! Async retry wrapper.
//!
//! Same retry rules as the blocking wrapper; the operation call and the delay
//! are both `.await` points, so the task yields instead of blocking its thread.
//! Attempts still run one after another: attempt N+1 starts only once attempt N
//! has resolved.
//!
//! # Cancellation
//!
//! Dropping the future returned by [`AsyncRetry::call`] (directly, through
//! `tokio::time::timeout`, or by aborting the task) cancels the call at its
//! current await point. A cancelled call is not a failure: it is never
//! classified, logged or retried.

use std::fmt;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use super::config::RetryConfig;
use super::state::{AttemptState, Step};

/// An async operation bound to a [`RetryConfig`].
///
/// # Examples
///
/// ```rust
/// use repeater::{AsyncRetry, RetryConfig};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// # tokio_test::block_on(async {
/// let calls = AtomicU32::new(0);
/// let fetch = RetryConfig::<String>::builder()
///     .tries(3)
///     .build()
///     .unwrap()
///     .bind_async(|id: u64| {
///         let n = calls.fetch_add(1, Ordering::SeqCst);
///         async move {
///             if n < 2 {
///                 Err(format!("backend busy ({})", id))
///             } else {
///                 Ok(id * 10)
///             }
///         }
///     });
///
/// assert_eq!(fetch.call(4).await, Ok(40));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// ```
pub struct AsyncRetry<F, E> {
    operation: F,
    config: Arc<RetryConfig<E>>,
}

impl<F, E> AsyncRetry<F, E> {
    /// Wrap `operation` with the default configuration.
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
    pub async fn call<A, T, Fut>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Clone,
        E: Display,
    {
        retry_async(&self.config, || (self.operation)(args.clone())).await
    }
}

impl<F: Clone, E> Clone for AsyncRetry<F, E> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<F, E> fmt::Debug for AsyncRetry<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRetry")
            .field("operation", &std::any::type_name::<F>())
            .field("config", &self.config)
            .finish()
    }
}

/// Run `operation` under `config`, sleeping asynchronously between attempts.
///
/// Each attempt awaits a fresh future from `operation`.
///
/// ```rust
/// use repeater::{retry_async, RetryConfig};
///
/// # tokio_test::block_on(async {
/// let config = RetryConfig::<String>::default();
/// let result = retry_async(&config, || async { Ok::<_, String>("ready") }).await;
/// assert_eq!(result, Ok("ready"));
/// # });
/// ```
pub async fn retry_async<T, E, F, Fut>(config: &RetryConfig<E>, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let start = Instant::now();
    let mut state = AttemptState::new(config);

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let (delay, next) = match config.on_failure(state, error, start.elapsed()) {
            Step::Retry { delay, next } => (delay, next),
            Step::Exhausted(error) | Step::Fail(error) => return Err(error),
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        state = next;
    }
}
