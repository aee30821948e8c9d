//! Error types for mixer-resilience
//!
//! All error types use thiserror for clean error handling.
//! Runtime failures of wrapped operations are reported as
//! [`ErrorRecord`](crate::models::ErrorRecord) instead; the enums here cover
//! configuration and user input.

/// Errors from reading startup configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Invalid endpoint URL in {var}: '{url}'")]
    InvalidUrl { var: String, url: String },

    #[error("Duplicate endpoint id: {0}")]
    DuplicateEndpoint(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

/// Errors from validating user-entered amounts and addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Amount cannot be empty")]
    EmptyAmount,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Amount is too large")]
    AmountOverflow,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
