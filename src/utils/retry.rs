//! Retry logic with exponential backoff for transient failures
//!
//! Wraps an async operation in a bounded retry loop. Each failure is
//! classified; only codes listed in [`RetryConfig::retryable_codes`] are
//! retried, everything else is returned immediately. Delays grow as
//! `initial_delay * backoff_multiplier^attempt`, are capped at `max_delay`,
//! and are optionally jittered by ±25%.

use crate::constants::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS,
    DEFAULT_MAX_RETRIES, JITTER_FRACTION,
};
use crate::core::Classifier;
use crate::models::{ErrorCode, ErrorRecord, RawError};
use rand::Rng;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Codes retried automatically unless the caller overrides the set
pub const DEFAULT_RETRYABLE_CODES: &[ErrorCode] = &[
    ErrorCode::RpcUnavailable,
    ErrorCode::ServiceUnavailable,
    ErrorCode::RateLimited,
    ErrorCode::Timeout,
    ErrorCode::ConnectionRefused,
    ErrorCode::DnsFailed,
];

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial attempt)
    pub max_retries: u32,
    /// Initial delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (typically 2.0)
    pub backoff_multiplier: f64,
    /// Scale each delay by a random factor in [0.75, 1.25]
    pub jitter: bool,
    /// Codes that trigger another attempt
    pub retryable_codes: HashSet<ErrorCode>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter: true,
            retryable_codes: DEFAULT_RETRYABLE_CODES.iter().copied().collect(),
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries (fail fast)
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1.0,
            jitter: false,
            ..Self::default()
        }
    }

    /// Create a configuration with aggressive retries for critical operations
    pub fn aggressive() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            backoff_multiplier: 2.0,
            ..Self::default()
        }
    }

    pub fn with_retryable_codes<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = ErrorCode>,
    {
        self.retryable_codes = codes.into_iter().collect();
        self
    }

    pub fn is_retryable(&self, code: ErrorCode) -> bool {
        self.retryable_codes.contains(&code)
    }

    /// Upper bound on calls to the wrapped operation
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Delay before retry number `attempt + 1`, without jitter.
///
/// Non-decreasing in `attempt` and never above `max_delay`. Multipliers
/// below 1.0 (or non-finite) are treated as 1.0.
pub fn base_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let multiplier = if config.backoff_multiplier.is_finite() && config.backoff_multiplier >= 1.0
    {
        config.backoff_multiplier
    } else {
        1.0
    };
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let secs = config.initial_delay.as_secs_f64() * multiplier.powi(exponent);
    let max_secs = config.max_delay.as_secs_f64();

    if !secs.is_finite() || secs >= max_secs {
        return config.max_delay;
    }
    Duration::from_secs_f64(secs).min(config.max_delay)
}

/// Delay before retry number `attempt + 1`, jittered when enabled.
///
/// Always `<= max_delay`.
pub fn compute_delay<R: Rng + ?Sized>(attempt: u32, config: &RetryConfig, rng: &mut R) -> Duration {
    let base = base_delay(attempt, config);
    if !config.jitter || base.is_zero() {
        return base;
    }

    let factor = rng.gen_range((1.0 - JITTER_FRACTION)..=(1.0 + JITTER_FRACTION));
    base.mul_f64(factor).min(config.max_delay)
}

/// Retry an async operation with exponential backoff
///
/// # Arguments
///
/// * `config` - Retry configuration
/// * `classifier` - Maps each failure to an [`ErrorCode`]
/// * `operation` - Async closure that returns `Result<T, E>`
/// * `on_retry` - Called before each wait with the 1-based number of the retry
///   about to run, the failure that caused it, and the delay
///
/// Attempts run strictly one after another and the operation is called at
/// most `max_retries + 1` times. The returned error always describes the most
/// recent attempt.
///
/// # Example
///
/// ```ignore
/// use mixer_resilience::core::Classifier;
/// use mixer_resilience::utils::retry::{retry_with_backoff, RetryConfig};
///
/// let balance = retry_with_backoff(
///     &RetryConfig::default(),
///     &Classifier::new(),
///     || async { rpc.get_balance(owner).await },
///     |attempt, err, delay| println!("retry {attempt} in {delay:?}: {err}"),
/// )
/// .await?;
/// ```
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    config: &RetryConfig,
    classifier: &Classifier,
    mut operation: F,
    mut on_retry: C,
) -> Result<T, ErrorRecord>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<RawError>,
    C: FnMut(u32, &ErrorRecord, Duration),
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                let record = classifier.record(err.into());

                if !config.is_retryable(record.code()) {
                    tracing::debug!(code = %record.code(), "not retrying");
                    return Err(record);
                }

                if attempt >= config.max_retries {
                    tracing::error!(
                        code = %record.code(),
                        attempts = attempt + 1,
                        "retries exhausted"
                    );
                    return Err(record);
                }

                let delay = compute_delay(attempt, config, &mut rand::thread_rng());
                attempt += 1;

                tracing::warn!(
                    code = %record.code(),
                    "attempt {}/{} failed, retrying in {:?}",
                    attempt,
                    config.max_attempts(),
                    delay
                );

                on_retry(attempt, &record, delay);
                sleep(delay).await;
            }
        }
    }
}
