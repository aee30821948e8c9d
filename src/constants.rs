//! # Application-Wide Constants
//!
//! Centralized configuration values and magic numbers used throughout the
//! resilience layer.
//!
//! ## Usage
//!
//! ```rust
//! use mixer_resilience::constants::*;
//! use std::time::Duration;
//!
//! let initial = Duration::from_millis(DEFAULT_INITIAL_DELAY_MS);
//! assert!(initial <= Duration::from_millis(DEFAULT_MAX_DELAY_MS));
//! ```

// ============================================================================
// Retry / Backoff Defaults
// ============================================================================

/// Retries after the initial attempt when no configuration is supplied
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry (milliseconds)
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1_000;

/// Upper bound for any single backoff delay (milliseconds)
///
/// **Rationale**: 10 seconds keeps a stalled form responsive enough that the
/// user is not left staring at a spinner, while still spacing retries far
/// enough apart to clear short RPC rate-limit windows.
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Exponential growth factor between consecutive delays
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Relative jitter applied to a delay (0.25 means ±25%)
pub const JITTER_FRACTION: f64 = 0.25;

// ============================================================================
// Stage Timeouts
// ============================================================================

/// Deadline for establishing an RPC or wallet connection (milliseconds)
pub const CONNECT_TIMEOUT_MS: u64 = 15_000;

/// Deadline for fetching and compiling circuit artifacts (milliseconds)
pub const LOADING_CIRCUIT_TIMEOUT_MS: u64 = 30_000;

/// Deadline for witness generation (milliseconds)
pub const GENERATING_WITNESS_TIMEOUT_MS: u64 = 30_000;

/// Deadline for the prover itself (milliseconds)
///
/// **Rationale**: in-browser proving on low-end hardware has been observed to
/// take well over a minute; two minutes avoids false positives.
pub const GENERATING_PROOF_TIMEOUT_MS: u64 = 120_000;

/// Deadline for local proof verification (milliseconds)
pub const VERIFYING_TIMEOUT_MS: u64 = 15_000;

/// Deadline for submitting the transaction and receiving a signature (milliseconds)
pub const SUBMITTING_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// Network Defaults
// ============================================================================

/// Public RPC endpoints used when no override is configured
pub const DEFAULT_MAINNET_RPC: &[&str] = &["https://api.mainnet-beta.solana.com"];
pub const DEFAULT_DEVNET_RPC: &[&str] = &["https://api.devnet.solana.com"];
pub const DEFAULT_TESTNET_RPC: &[&str] = &["https://api.testnet.solana.com"];
pub const DEFAULT_LOCALNET_RPC: &[&str] = &["http://127.0.0.1:8899"];

/// Native token decimals used by amount inputs
pub const NATIVE_DECIMALS: u8 = 9;

/// Base58 address length bounds (32-byte public keys)
pub const MIN_ADDRESS_LENGTH: usize = 32;
pub const MAX_ADDRESS_LENGTH: usize = 44;

// ============================================================================
// Environment Variables
// ============================================================================

pub const ENV_NETWORK: &str = "MIXER_NETWORK";
/// Prefix for per-network endpoint lists, e.g. `MIXER_RPC_DEVNET`
pub const ENV_RPC_PREFIX: &str = "MIXER_RPC_";
pub const ENV_MAX_RETRIES: &str = "MIXER_MAX_RETRIES";
pub const ENV_INITIAL_DELAY_MS: &str = "MIXER_INITIAL_DELAY_MS";
pub const ENV_MAX_DELAY_MS: &str = "MIXER_MAX_DELAY_MS";
pub const ENV_BACKOFF_MULTIPLIER: &str = "MIXER_BACKOFF_MULTIPLIER";
pub const ENV_RETRY_JITTER: &str = "MIXER_RETRY_JITTER";
pub const ENV_ENABLE_FALLBACK: &str = "MIXER_ENABLE_FALLBACK";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "MIXER_CONNECT_TIMEOUT_MS";
pub const ENV_ASSUME_ONLINE: &str = "MIXER_ASSUME_ONLINE";
pub const ENV_LOG: &str = "MIXER_LOG";
pub const ENV_LOG_VERBOSE: &str = "MIXER_LOG_VERBOSE";
