//! Closed error taxonomy and the user-facing text attached to each code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every failure the front-end knows how to explain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Network
    Offline,
    RpcUnavailable,
    ServiceUnavailable,
    RateLimited,
    Timeout,
    ConnectionRefused,
    DnsFailed,
    TlsError,
    // Wallet
    UserRejected,
    WalletNotFound,
    WalletNotConnected,
    SigningFailed,
    InsufficientFunds,
    InvalidAddress,
    TransactionExpired,
    // Proof
    ProofGenerationFailed,
    ProofTimeout,
    CircuitLoadFailed,
    WitnessGenerationFailed,
    ProofVerificationFailed,
    Unknown,
}

/// Which collaborator a code describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorDomain {
    Network,
    Wallet,
    Proof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Fixed presentation and policy attached to an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub title: &'static str,
    pub message: &'static str,
    /// Label for the suggested action button
    pub action: &'static str,
    pub severity: Severity,
    pub retryable: bool,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 21] = [
        ErrorCode::Offline,
        ErrorCode::RpcUnavailable,
        ErrorCode::ServiceUnavailable,
        ErrorCode::RateLimited,
        ErrorCode::Timeout,
        ErrorCode::ConnectionRefused,
        ErrorCode::DnsFailed,
        ErrorCode::TlsError,
        ErrorCode::UserRejected,
        ErrorCode::WalletNotFound,
        ErrorCode::WalletNotConnected,
        ErrorCode::SigningFailed,
        ErrorCode::InsufficientFunds,
        ErrorCode::InvalidAddress,
        ErrorCode::TransactionExpired,
        ErrorCode::ProofGenerationFailed,
        ErrorCode::ProofTimeout,
        ErrorCode::CircuitLoadFailed,
        ErrorCode::WitnessGenerationFailed,
        ErrorCode::ProofVerificationFailed,
        ErrorCode::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Offline => "OFFLINE",
            ErrorCode::RpcUnavailable => "RPC_UNAVAILABLE",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::ConnectionRefused => "CONNECTION_REFUSED",
            ErrorCode::DnsFailed => "DNS_FAILED",
            ErrorCode::TlsError => "TLS_ERROR",
            ErrorCode::UserRejected => "USER_REJECTED",
            ErrorCode::WalletNotFound => "WALLET_NOT_FOUND",
            ErrorCode::WalletNotConnected => "WALLET_NOT_CONNECTED",
            ErrorCode::SigningFailed => "SIGNING_FAILED",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::InvalidAddress => "INVALID_ADDRESS",
            ErrorCode::TransactionExpired => "TRANSACTION_EXPIRED",
            ErrorCode::ProofGenerationFailed => "PROOF_GENERATION_FAILED",
            ErrorCode::ProofTimeout => "PROOF_TIMEOUT",
            ErrorCode::CircuitLoadFailed => "CIRCUIT_LOAD_FAILED",
            ErrorCode::WitnessGenerationFailed => "WITNESS_GENERATION_FAILED",
            ErrorCode::ProofVerificationFailed => "PROOF_VERIFICATION_FAILED",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    pub fn domain(&self) -> ErrorDomain {
        match self {
            ErrorCode::Offline
            | ErrorCode::RpcUnavailable
            | ErrorCode::ServiceUnavailable
            | ErrorCode::RateLimited
            | ErrorCode::Timeout
            | ErrorCode::ConnectionRefused
            | ErrorCode::DnsFailed
            | ErrorCode::TlsError
            | ErrorCode::Unknown => ErrorDomain::Network,
            ErrorCode::UserRejected
            | ErrorCode::WalletNotFound
            | ErrorCode::WalletNotConnected
            | ErrorCode::SigningFailed
            | ErrorCode::InsufficientFunds
            | ErrorCode::InvalidAddress
            | ErrorCode::TransactionExpired => ErrorDomain::Wallet,
            ErrorCode::ProofGenerationFailed
            | ErrorCode::ProofTimeout
            | ErrorCode::CircuitLoadFailed
            | ErrorCode::WitnessGenerationFailed
            | ErrorCode::ProofVerificationFailed => ErrorDomain::Proof,
        }
    }

    /// Whether the code is retryable by table. Callers still decide which
    /// retryable codes are retried automatically.
    pub fn is_retryable(&self) -> bool {
        self.info().retryable
    }

    pub fn info(&self) -> &'static ErrorInfo {
        use Severity::*;

        macro_rules! info {
            ($title:expr, $message:expr, $action:expr, $severity:expr, $retryable:expr) => {{
                const INFO: ErrorInfo = ErrorInfo {
                    title: $title,
                    message: $message,
                    action: $action,
                    severity: $severity,
                    retryable: $retryable,
                };
                &INFO
            }};
        }

        match self {
            ErrorCode::Offline => info!(
                "You're offline",
                "Check your internet connection. We'll keep your form as it is.",
                "Retry",
                Warning,
                true
            ),
            ErrorCode::RpcUnavailable => info!(
                "Network unavailable",
                "The network node could not be reached. Trying another endpoint may help.",
                "Retry",
                Error,
                true
            ),
            ErrorCode::ServiceUnavailable => info!(
                "Service unavailable",
                "The RPC service is having problems right now. Please try again shortly.",
                "Retry",
                Error,
                true
            ),
            ErrorCode::RateLimited => info!(
                "Too many requests",
                "The network is rate limiting requests. Wait a moment before trying again.",
                "Retry",
                Warning,
                true
            ),
            ErrorCode::Timeout => info!(
                "Request timed out",
                "The network took too long to respond.",
                "Retry",
                Warning,
                true
            ),
            ErrorCode::ConnectionRefused => info!(
                "Connection refused",
                "The endpoint refused the connection.",
                "Retry",
                Error,
                true
            ),
            ErrorCode::DnsFailed => info!(
                "Endpoint not found",
                "The endpoint address could not be resolved.",
                "Retry",
                Error,
                true
            ),
            ErrorCode::TlsError => info!(
                "Secure connection failed",
                "A secure connection to the endpoint could not be established.",
                "Switch endpoint",
                Error,
                false
            ),
            ErrorCode::UserRejected => info!(
                "Request rejected",
                "You rejected the request in your wallet.",
                "Try again",
                Info,
                true
            ),
            ErrorCode::WalletNotFound => info!(
                "Wallet not found",
                "No compatible wallet was detected. Install a wallet extension and reload.",
                "Install wallet",
                Error,
                false
            ),
            ErrorCode::WalletNotConnected => info!(
                "Wallet not connected",
                "Connect your wallet to continue.",
                "Connect wallet",
                Warning,
                true
            ),
            ErrorCode::SigningFailed => info!(
                "Signing failed",
                "Your wallet could not sign the transaction.",
                "Try again",
                Error,
                true
            ),
            ErrorCode::InsufficientFunds => info!(
                "Insufficient funds",
                "Your balance does not cover the amount plus network fees.",
                "Adjust amount",
                Error,
                false
            ),
            ErrorCode::InvalidAddress => info!(
                "Invalid address",
                "The recipient address is not valid.",
                "Edit address",
                Error,
                false
            ),
            ErrorCode::TransactionExpired => info!(
                "Transaction expired",
                "The transaction was not confirmed in time and has expired.",
                "Resubmit",
                Warning,
                true
            ),
            ErrorCode::ProofGenerationFailed => info!(
                "Proof generation failed",
                "The zero-knowledge proof could not be generated.",
                "Try again",
                Error,
                true
            ),
            ErrorCode::ProofTimeout => info!(
                "Proof generation timed out",
                "Generating the proof took too long. Close other tabs and try again.",
                "Try again",
                Warning,
                true
            ),
            ErrorCode::CircuitLoadFailed => info!(
                "Circuit failed to load",
                "The proving circuit could not be downloaded.",
                "Reload",
                Error,
                true
            ),
            ErrorCode::WitnessGenerationFailed => info!(
                "Invalid inputs",
                "The proof inputs are inconsistent. Check your note and amount.",
                "Review inputs",
                Error,
                false
            ),
            ErrorCode::ProofVerificationFailed => info!(
                "Proof rejected",
                "The generated proof did not verify.",
                "Start over",
                Critical,
                false
            ),
            ErrorCode::Unknown => info!(
                "Something went wrong",
                "An unexpected error occurred.",
                "Try again",
                Error,
                true
            ),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
