//! Per-invocation attempt state and the retry decision shared by both modes.

use std::fmt::Display;
use std::time::Duration;

use super::config::{RetryConfig, RetryEvent};

/// Where an invocation stands in its retry sequence.
///
/// Created fresh at the start of every call and threaded through the loop by
/// value. Nothing here outlives the call or is shared between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    attempt: u32,
    current_delay: Duration,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<E> {
    /// Wait `delay` (nothing to wait when zero), then run attempt `next`.
    Retry {
        /// Delay before the next attempt.
        delay: Duration,
        /// State for the next attempt.
        next: AttemptState,
    },
    /// The failure was retryable but this was the last attempt.
    Exhausted(E),
    /// The failure is not retryable.
    Fail(E),
}

impl AttemptState {
    /// State for the first attempt of a call.
    pub fn new<E>(config: &RetryConfig<E>) -> Self {
        Self {
            attempt: 0,
            current_delay: config.delay,
        }
    }

    /// 0-based attempt index.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// 1-based attempt number, as reported in logs.
    pub fn number(&self) -> u32 {
        self.attempt + 1
    }

    /// Delay to wait if this attempt fails and is retried.
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// Returns true if no attempt is allowed after this one.
    pub fn is_last(&self, tries: u32) -> bool {
        self.number() >= tries
    }

    /// State for the following attempt, with the delay scaled by `backoff`.
    ///
    /// A negative or NaN `backoff` drops the delay to zero.
    pub fn advance(self, backoff: f64) -> Self {
        Self {
            attempt: self.attempt + 1,
            current_delay: scale(self.current_delay, backoff),
        }
    }
}

/// Multiply a delay, saturating at `Duration::MAX`.
fn scale(delay: Duration, factor: f64) -> Duration {
    if delay.is_zero() || factor == 1.0 {
        return delay;
    }
    if factor.is_nan() || factor <= 0.0 {
        return Duration::ZERO;
    }
    // Whole multipliers stay exact.
    if factor.fract() == 0.0 && factor <= f64::from(u32::MAX) {
        return delay.checked_mul(factor as u32).unwrap_or(Duration::MAX);
    }
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

impl<E: Display> RetryConfig<E> {
    /// Decide what follows a failed attempt.
    ///
    /// Classifies `error`, emits the warning or exhaustion log event, notifies
    /// the `on_retry` hook and returns the next [`Step`]. Both the blocking and
    /// the async wrappers drive their loops with this; it is public for
    /// callers who need to drive a retry loop of their own.
    ///
    /// ```rust
    /// use repeater::{AttemptState, RetryConfig, Step};
    /// use std::time::Duration;
    ///
    /// let config = RetryConfig::<String>::builder()
    ///     .tries(2)
    ///     .delay(Duration::from_millis(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let first = AttemptState::new(&config);
    /// let next = match config.on_failure(first, "busy".to_string(), Duration::ZERO) {
    ///     Step::Retry { delay, next } => {
    ///         assert_eq!(delay, Duration::from_millis(10));
    ///         next
    ///     }
    ///     other => panic!("expected a retry, got {:?}", other),
    /// };
    ///
    /// assert_eq!(
    ///     config.on_failure(next, "still busy".to_string(), Duration::ZERO),
    ///     Step::Exhausted("still busy".to_string())
    /// );
    /// ```
    pub fn on_failure(&self, state: AttemptState, error: E, elapsed: Duration) -> Step<E> {
        if !self.retry_on.matches(&error) {
            return Step::Fail(error);
        }

        let tries = self.tries.get();

        if state.is_last(tries) {
            log_exhausted(tries, &error);
            self.notify(&RetryEvent {
                attempt: state.number(),
                tries,
                error: &error,
                next_delay: None,
                elapsed,
            });
            return Step::Exhausted(error);
        }

        let delay = state.current_delay();
        log_retrying(state.number(), tries, &error, delay);
        self.notify(&RetryEvent {
            attempt: state.number(),
            tries,
            error: &error,
            next_delay: Some(delay),
            elapsed,
        });

        Step::Retry {
            delay,
            next: state.advance(self.backoff),
        }
    }
}

#[cfg(feature = "tracing")]
fn log_retrying<E: Display>(attempt: u32, tries: u32, error: &E, delay: Duration) {
    let delay_secs = delay.as_secs_f64();
    tracing::warn!(
        target: "repeater::retry",
        attempt,
        tries,
        delay_secs,
        "Attempt {}/{} failed: {}. Retrying in {:.2}s...",
        attempt,
        tries,
        error,
        delay_secs
    );
}

#[cfg(not(feature = "tracing"))]
fn log_retrying<E: Display>(_attempt: u32, _tries: u32, _error: &E, _delay: Duration) {}

#[cfg(feature = "tracing")]
fn log_exhausted<E: Display>(tries: u32, error: &E) {
    tracing::error!(
        target: "repeater::retry",
        tries,
        "All {} attempts failed. Last error: {}",
        tries,
        error
    );
}

#[cfg(not(feature = "tracing"))]
fn log_exhausted<E: Display>(_tries: u32, _error: &E) {}

#[cfg(test)]
mod state_tests {
    use super::*;
    use crate::retry::RetryOn;
    use std::sync::{Arc, Mutex};

    fn config(tries: u32, delay: Duration, backoff: f64) -> RetryConfig<String> {
        RetryConfig::builder()
            .tries(tries)
            .delay(delay)
            .backoff(backoff)
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_state_starts_at_first_attempt() {
        let state = AttemptState::new(&config(3, Duration::from_millis(500), 2.0));

        assert_eq!(state.attempt(), 0);
        assert_eq!(state.number(), 1);
        assert_eq!(state.current_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_advance_applies_backoff() {
        let state = AttemptState::new(&config(4, Duration::from_millis(500), 2.0));

        let second = state.advance(2.0);
        let third = second.advance(2.0);

        assert_eq!(second.number(), 2);
        assert_eq!(second.current_delay(), Duration::from_secs(1));
        assert_eq!(third.number(), 3);
        assert_eq!(third.current_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_advance_fractional_backoff() {
        let state = AttemptState::new(&config(3, Duration::from_secs(1), 0.5));
        assert_eq!(state.advance(0.5).current_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_backoff_drops_delay() {
        let state = AttemptState::new(&config(3, Duration::from_secs(1), 0.0));
        assert_eq!(state.advance(0.0).current_delay(), Duration::ZERO);
    }

    #[test]
    fn test_advance_clamps_invalid_backoff() {
        let state = AttemptState::new(&config(3, Duration::from_secs(1), 2.0));

        for backoff in [-2.0, -0.5, f64::NAN, f64::NEG_INFINITY] {
            let next = state.advance(backoff);
            assert_eq!(next.number(), 2);
            assert_eq!(next.current_delay(), Duration::ZERO, "backoff {}", backoff);
        }
    }

    #[test]
    fn test_zero_delay_stays_zero() {
        let mut state = AttemptState::new(&config(10, Duration::ZERO, 3.0));
        for _ in 0..8 {
            state = state.advance(3.0);
            assert_eq!(state.current_delay(), Duration::ZERO);
        }
    }

    #[test]
    fn test_scale_saturates() {
        assert_eq!(scale(Duration::MAX, 2.0), Duration::MAX);
        assert_eq!(scale(Duration::from_secs(u64::MAX / 2), 2.5), Duration::MAX);
        assert_eq!(scale(Duration::from_secs(1), 1e300), Duration::MAX);
    }

    #[test]
    fn test_is_last() {
        let state = AttemptState::new(&config(2, Duration::ZERO, 1.0));
        assert!(!state.is_last(2));
        assert!(state.advance(1.0).is_last(2));
        assert!(state.is_last(1));
    }

    #[test]
    fn test_on_failure_not_retryable() {
        let config = RetryConfig::<String>::builder()
            .tries(3)
            .retry_on(RetryOn::when(|err: &String| err == "transient"))
            .build()
            .unwrap();

        let first = AttemptState::new(&config);
        let step = config.on_failure(first, "fatal".to_string(), Duration::ZERO);
        assert_eq!(step, Step::Fail("fatal".to_string()));
    }

    #[test]
    fn test_on_failure_not_retryable_even_on_last_attempt() {
        let config = RetryConfig::<String>::builder()
            .tries(1)
            .retry_on(RetryOn::never())
            .build()
            .unwrap();

        let first = AttemptState::new(&config);
        let step = config.on_failure(first, "fatal".to_string(), Duration::ZERO);
        assert_eq!(step, Step::Fail("fatal".to_string()));
    }

    #[test]
    fn test_on_failure_walks_the_delay_sequence() {
        let config = config(3, Duration::from_millis(500), 2.0);
        let mut state = AttemptState::new(&config);
        let mut delays = Vec::new();

        loop {
            match config.on_failure(state, "down".to_string(), Duration::ZERO) {
                Step::Retry { delay, next } => {
                    delays.push(delay);
                    state = next;
                }
                Step::Exhausted(err) => {
                    assert_eq!(err, "down");
                    break;
                }
                Step::Fail(_) => panic!("default filter retries everything"),
            }
        }

        assert_eq!(
            delays,
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
    }

    #[test]
    fn test_on_failure_notifies_hook() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let config = RetryConfig::<String>::builder()
            .tries(2)
            .delay(Duration::from_millis(5))
            .on_retry({
                let events = Arc::clone(&events);
                move |event| {
                    events.lock().unwrap().push((
                        event.attempt,
                        event.tries,
                        event.error.clone(),
                        event.next_delay,
                    ));
                }
            })
            .build()
            .unwrap();

        let first = AttemptState::new(&config);
        let next = match config.on_failure(first, "a".to_string(), Duration::ZERO) {
            Step::Retry { next, .. } => next,
            other => panic!("unexpected {:?}", other),
        };
        let _ = config.on_failure(next, "b".to_string(), Duration::ZERO);

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (1, 2, "a".to_string(), Some(Duration::from_millis(5))),
                (2, 2, "b".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_hook_not_called_for_non_retryable() {
        let calls = Arc::new(Mutex::new(0u32));
        let config = RetryConfig::<String>::builder()
            .retry_on(RetryOn::never())
            .on_retry({
                let calls = Arc::clone(&calls);
                move |_| *calls.lock().unwrap() += 1
            })
            .build()
            .unwrap();

        let first = AttemptState::new(&config);
        let _ = config.on_failure(first, "x".to_string(), Duration::ZERO);
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
