//! Error classification
//!
//! Maps any caught value to one [`ErrorCode`] by running an ordered rule table
//! over the lower-cased `"{name} {message}"` text. The first matching rule
//! wins; no match yields [`ErrorCode::Unknown`]. If the connectivity probe
//! reports offline, classification short-circuits to [`ErrorCode::Offline`]
//! before any rule runs.
//!
//! Classification never fails: every input maps to exactly one code.

use crate::models::{ErrorCode, ErrorRecord, RawError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source of the "is the client online" flag
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Probe for environments with no connectivity signal
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Connectivity flag updated by the host (browser `online`/`offline` events,
/// OS network notifications, ...)
#[derive(Debug)]
pub struct OnlineFlag(AtomicBool);

impl OnlineFlag {
    pub fn new(online: bool) -> Self {
        Self(AtomicBool::new(online))
    }

    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::Relaxed);
    }
}

impl Default for OnlineFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProbe for OnlineFlag {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A text predicate over the lower-cased haystack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Any of the substrings occurs
    Any(&'static [&'static str]),
    /// At least one substring from each list occurs
    Both(&'static [&'static str], &'static [&'static str]),
    /// A standalone three-digit token lies in the inclusive range
    Status(u16, u16),
}

impl Matcher {
    pub fn matches(&self, haystack: &str) -> bool {
        match self {
            Matcher::Any(needles) => needles.iter().any(|n| haystack.contains(n)),
            Matcher::Both(first, second) => {
                first.iter().any(|n| haystack.contains(n))
                    && second.iter().any(|n| haystack.contains(n))
            }
            Matcher::Status(lo, hi) => haystack
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|token| token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit()))
                .filter_map(|token| token.parse::<u16>().ok())
                .any(|status| (*lo..=*hi).contains(&status)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub matcher: Matcher,
    pub code: ErrorCode,
}

const fn rule(matcher: Matcher, code: ErrorCode) -> Rule {
    Rule { matcher, code }
}

const PROOF_WORDS: &[&str] = &["proof", "prover", "proving"];

/// Default rule order. Earlier rules shadow later ones, so specific codes
/// (wallet rejections, proof timeouts) come before generic transport codes.
pub const DEFAULT_RULES: &[Rule] = &[
    rule(
        Matcher::Any(&[
            "user rejected",
            "user denied",
            "rejected the request",
            "user cancelled",
            "user canceled",
            "request rejected",
        ]),
        ErrorCode::UserRejected,
    ),
    rule(
        Matcher::Any(&[
            "walletnotreadyerror",
            "wallet not found",
            "wallet not installed",
            "no wallet",
            "wallet not detected",
        ]),
        ErrorCode::WalletNotFound,
    ),
    rule(
        Matcher::Any(&[
            "walletnotconnectederror",
            "wallet not connected",
            "wallet disconnected",
        ]),
        ErrorCode::WalletNotConnected,
    ),
    rule(
        Matcher::Any(&[
            "walletsigntransactionerror",
            "walletsignmessageerror",
            "signing failed",
            "failed to sign",
            "signature request failed",
        ]),
        ErrorCode::SigningFailed,
    ),
    rule(
        Matcher::Any(&[
            "insufficient funds",
            "insufficient balance",
            "insufficient lamports",
            "not enough balance",
        ]),
        ErrorCode::InsufficientFunds,
    ),
    rule(
        Matcher::Any(&[
            "invalid address",
            "invalid public key",
            "invalid pubkey",
            "non-base58",
        ]),
        ErrorCode::InvalidAddress,
    ),
    rule(
        Matcher::Any(&[
            "blockhash not found",
            "block height exceeded",
            "transaction expired",
        ]),
        ErrorCode::TransactionExpired,
    ),
    rule(
        Matcher::Any(&[
            "certificate",
            "ssl",
            "tls",
            "handshake",
        ]),
        ErrorCode::TlsError,
    ),
    rule(
        Matcher::Any(&[
            "circuit not found",
            "failed to load circuit",
            "circuit load",
            "zkey",
            "circuit file",
        ]),
        ErrorCode::CircuitLoadFailed,
    ),
    rule(Matcher::Any(&["witness"]), ErrorCode::WitnessGenerationFailed),
    rule(
        Matcher::Any(&["invalid proof", "proof verification", "verify proof"]),
        ErrorCode::ProofVerificationFailed,
    ),
    rule(
        Matcher::Both(PROOF_WORDS, &["timeout", "timed out"]),
        ErrorCode::ProofTimeout,
    ),
    rule(Matcher::Any(PROOF_WORDS), ErrorCode::ProofGenerationFailed),
    rule(Matcher::Status(429, 429), ErrorCode::RateLimited),
    rule(
        Matcher::Any(&["rate limit", "rate-limit", "too many requests"]),
        ErrorCode::RateLimited,
    ),
    rule(
        Matcher::Any(&["timeout", "timed out", "etimedout", "deadline exceeded"]),
        ErrorCode::Timeout,
    ),
    rule(
        Matcher::Any(&[
            "connection refused",
            "econnrefused",
            "connection reset",
            "econnreset",
        ]),
        ErrorCode::ConnectionRefused,
    ),
    rule(
        Matcher::Any(&[
            "enotfound",
            "dns",
            "name resolution",
            "could not resolve",
            "getaddrinfo",
        ]),
        ErrorCode::DnsFailed,
    ),
    rule(Matcher::Status(500, 599), ErrorCode::ServiceUnavailable),
    rule(
        Matcher::Any(&["service unavailable", "bad gateway", "internal server error"]),
        ErrorCode::ServiceUnavailable,
    ),
    rule(
        Matcher::Any(&[
            "failed to fetch",
            "fetch failed",
            "network error",
            "networkerror",
            "socket hang up",
            "rpc unavailable",
            "rpc node unavailable",
            "rpc error: connect",
            "no rpc endpoint",
        ]),
        ErrorCode::RpcUnavailable,
    ),
];

/// Classifier over an ordered rule table
///
/// Built once at startup and shared by reference; the table is never mutated.
#[derive(Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    connectivity: Arc<dyn ConnectivityProbe>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rules.len())
            .field("online", &self.connectivity.is_online())
            .finish()
    }
}

impl Classifier {
    /// Default rules, always online
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
            connectivity: Arc::new(AlwaysOnline),
        }
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn ConnectivityProbe>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify a raw error to its code
    pub fn classify(&self, raw: &RawError) -> ErrorCode {
        if !self.connectivity.is_online() {
            return ErrorCode::Offline;
        }

        if let Some(code) = raw.code {
            return code;
        }

        let haystack = raw.haystack();
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(&haystack))
            .map(|rule| rule.code)
            .unwrap_or(ErrorCode::Unknown)
    }

    /// Classify and build the full record
    pub fn record(&self, raw: RawError) -> ErrorRecord {
        let code = self.classify(&raw);
        tracing::debug!(code = %code, error = %raw, "classified error");
        ErrorRecord::new(code, raw)
    }

    pub fn classify_message(&self, message: &str) -> ErrorCode {
        self.classify(&RawError::new(message))
    }

    pub fn record_error<E: std::error::Error + ?Sized>(&self, err: &E) -> ErrorRecord {
        self.record(RawError::from_error(err))
    }
}
