//! # Repeater
//!
//! Transparent retries for fallible operations.
//!
//! Bind a [`RetryConfig`] to an operation once and call the result exactly as
//! you would call the operation. Retryable failures are re-attempted with an
//! optional delay that grows by a backoff multiplier; everything else behaves
//! as if no wrapper were there.
//!
//! ## Quick Example
//!
//! ```rust
//! use repeater::{RetryConfig, RetryOn};
//! use std::cell::Cell;
//! use std::io;
//!
//! let attempts = Cell::new(0);
//!
//! let connect = RetryConfig::<io::Error>::builder()
//!     .tries(3)
//!     .retry_on(RetryOn::kind(io::ErrorKind::ConnectionRefused))
//!     .build()
//!     .unwrap()
//!     .bind(|addr: &str| {
//!         attempts.set(attempts.get() + 1);
//!         if attempts.get() < 3 {
//!             Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
//!         } else {
//!             Ok(format!("connected to {}", addr))
//!         }
//!     });
//!
//! assert_eq!(connect.call("10.0.0.1:80").unwrap(), "connected to 10.0.0.1:80");
//! assert_eq!(attempts.get(), 3);
//! ```
//!
//! ## Async
//!
//! With the `async` feature (on by default), [`RetryConfig::bind_async`] wraps
//! operations returning futures and waits with `tokio::time::sleep`:
//!
//! ```rust
//! # #[cfg(feature = "async")]
//! # tokio_test::block_on(async {
//! use repeater::AsyncRetry;
//!
//! let lookup = AsyncRetry::new(|key: &'static str| async move {
//!     Ok::<_, String>(key.len())
//! });
//!
//! assert_eq!(lookup.call("user:42").await, Ok(7));
//! # });
//! ```
//!
//! ## Features
//!
//! - `async` (default): [`AsyncRetry`] and [`retry_async`], built on tokio
//! - `tracing` (default): warning and error events for failed attempts
//! - `serde`: [`RetrySettings`], loadable retry settings

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod retry;
pub mod testing;

// Re-exports
pub use retry::{
    retry, AttemptState, Classify, ConfigError, Retry, RetryConfig, RetryConfigBuilder,
    RetryEvent, RetryOn, Step,
};
#[cfg(feature = "serde")]
pub use retry::RetrySettings;
#[cfg(feature = "async")]
pub use retry::{retry_async, AsyncRetry};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::retry::{Classify, Retry, RetryConfig, RetryOn};
    #[cfg(feature = "async")]
    pub use crate::retry::AsyncRetry;
}
