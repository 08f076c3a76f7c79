//! Transparent retry wrappers for blocking and async operations.
//!
//! A [`RetryConfig`] is bound once to an operation. The resulting wrapper has
//! the operation's own call contract: it returns the first success, or the
//! operation's own error, untouched, once retrying stops.
//!
//! - **Blocking**: [`Retry`] sleeps the calling thread between attempts
//! - **Async**: [`AsyncRetry`] awaits `tokio::time::sleep` between attempts
//!   (feature `async`, on by default)
//!
//! Both modes share one decision function, [`RetryConfig::on_failure`], so
//! they count attempts, grow delays and classify failures identically.
//!
//! # Quick Start
//!
//! ```rust
//! use repeater::{RetryConfig, RetryOn};
//! use std::cell::Cell;
//! use std::io;
//! use std::time::Duration;
//!
//! let calls = Cell::new(0);
//! let read_sensor = RetryConfig::<io::Error>::builder()
//!     .tries(3)
//!     .delay(Duration::from_millis(1))
//!     .backoff(2.0)
//!     .retry_on(RetryOn::kinds([io::ErrorKind::TimedOut, io::ErrorKind::Interrupted]))
//!     .build()
//!     .unwrap()
//!     .bind(|channel: u8| {
//!         calls.set(calls.get() + 1);
//!         if calls.get() == 1 {
//!             Err(io::Error::from(io::ErrorKind::TimedOut))
//!         } else {
//!             Ok(f64::from(channel) * 1.5)
//!         }
//!     });
//!
//! assert_eq!(read_sensor.call(2).unwrap(), 3.0);
//! assert_eq!(calls.get(), 2);
//! ```
//!
//! # Retry Rules
//!
//! After a failed attempt:
//!
//! - a failure the [`RetryOn`] filter rejects propagates at once, with no delay
//!   and no log event
//! - a retryable failure before the last attempt logs a warning, waits the
//!   current delay (skipped when zero), multiplies the delay by `backoff` and
//!   tries again
//! - a retryable failure on the last attempt logs an error and propagates
//!
//! # Logging
//!
//! With the `tracing` feature (on by default) the wrappers emit, on target
//! `repeater::retry`:
//!
//! - `WARN  Attempt 1/3 failed: <error>. Retrying in 0.50s...`
//! - `ERROR All 3 attempts failed. Last error: <error>`

mod blocking;
mod classify;
mod config;
mod error;
#[cfg(feature = "serde")]
mod settings;
mod state;
#[cfg(feature = "async")]
mod suspending;

pub use blocking::{retry, Retry};
pub use classify::{Classify, RetryOn};
pub use config::{RetryConfig, RetryConfigBuilder, RetryEvent};
pub use error::ConfigError;
#[cfg(feature = "serde")]
pub use settings::RetrySettings;
pub use state::{AttemptState, Step};
#[cfg(feature = "async")]
pub use suspending::{retry_async, AsyncRetry};
