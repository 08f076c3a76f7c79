//! Testing utilities for code that uses retry wrappers.
//!
//! [`Script`] stands in for a flaky dependency: it hands out a queue of
//! prepared outcomes, one per call, and counts the calls.
//!
//! # Examples
//!
//! ```rust
//! use repeater::testing::Script;
//! use repeater::RetryConfig;
//!
//! let script = Script::failing_then(["timeout", "timeout"], 42);
//! let wrapped = RetryConfig::default().bind(|()| script.next());
//!
//! assert_eq!(wrapped.call(()), Ok(42));
//! assert_eq!(script.calls(), 3);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

/// A scripted operation returning queued outcomes in order.
///
/// `Script` is `Sync`, so one script can back an operation shared between
/// threads or tasks.
#[derive(Debug)]
pub struct Script<T, E> {
    outcomes: Mutex<VecDeque<Result<T, E>>>,
    calls: AtomicU32,
}

impl<T, E> Script<T, E> {
    /// Create a script from outcomes, returned one per call.
    pub fn new<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: AtomicU32::new(0),
        }
    }

    /// Fail with each of `errors` in turn, then succeed with `value`.
    pub fn failing_then<I>(errors: I, value: T) -> Self
    where
        I: IntoIterator<Item = E>,
    {
        Self::new(errors.into_iter().map(Err).chain(Some(Ok(value))))
    }

    /// Fail with each of `errors` in turn.
    pub fn failing<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
    {
        Self::new(errors.into_iter().map(Err))
    }

    /// Take the next outcome.
    ///
    /// # Panics
    ///
    /// Panics when the script has run out of outcomes: the code under test
    /// called the operation more often than the test planned for.
    pub fn next(&self) -> Result<T, E> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match outcome {
            Some(outcome) => outcome,
            None => panic!("script exhausted: call {} has no outcome", calls),
        }
    }

    /// Number of calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of outcomes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
