//! # Utilities Module
//!
//! Cross-cutting concerns and shared functionality used throughout the crate.
//!
//! ## Modules
//!
//! - [`errors`]: Typed error hierarchy using `thiserror` for configuration and input errors
//! - [`retry`]: Exponential backoff retry logic for transient network failures
//!
//! ## Design Notes
//!
//! Retry logic uses tokio's async timer and is configurable per operation type.
//! Whether a failure is retried depends only on its classified code: transient
//! codes (timeouts, rate limits, unavailable nodes) are retried with backoff,
//! while wallet and proof failures surface immediately.

pub mod errors;
pub mod retry;

pub use errors::{ConfigError, ValidationError};
pub use retry::{base_delay, compute_delay, retry_with_backoff, RetryConfig};

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
