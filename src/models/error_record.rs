//! Classified error values handed to the UI layer.
//!
//! A [`RawError`] is whatever an external collaborator threw, flattened to a
//! name and a message. An [`ErrorRecord`] is the immutable result of
//! classifying it.

use super::error_code::{ErrorCode, ErrorInfo, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A caught value, coerced to text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawError {
    /// Error type name, when the value had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message: String,
    /// Code assigned by an earlier classification. Classifiers keep it
    /// instead of re-matching the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl RawError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: None,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Flatten a Rust error, including its source chain, into a raw error.
    ///
    /// The name is the unqualified type name of `E`.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        let full = std::any::type_name::<E>();
        let name = if full.starts_with("dyn ") {
            None
        } else {
            let base = full.split('<').next().unwrap_or(full);
            base.rsplit("::").next().map(str::to_string)
        };

        Self {
            name,
            message,
            code: None,
        }
    }

    /// Coerce a plain JSON value. Objects contribute their `name` and
    /// `message` fields when present; anything else is used as JSON text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::new(s.clone()),
            Value::Object(map) => {
                let name = map.get("name").and_then(Value::as_str).map(str::to_string);
                match map.get("message").and_then(Value::as_str) {
                    Some(message) => Self {
                        name,
                        message: message.to_string(),
                        code: None,
                    },
                    None => Self {
                        name,
                        message: value.to_string(),
                        code: None,
                    },
                }
            }
            Value::Null => Self::new(""),
            other => Self::new(other.to_string()),
        }
    }

    /// Lower-cased `"{name} {message}"` used for rule matching
    pub fn haystack(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {}", name, self.message).to_lowercase(),
            None => self.message.to_lowercase(),
        }
    }
}

impl fmt::Display for RawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl From<&str> for RawError {
    fn from(value: &str) -> Self {
        RawError::new(value)
    }
}

impl From<String> for RawError {
    fn from(value: String) -> Self {
        RawError::new(value)
    }
}

impl From<&Value> for RawError {
    fn from(value: &Value) -> Self {
        RawError::from_value(value)
    }
}

impl From<Value> for RawError {
    fn from(value: Value) -> Self {
        RawError::from_value(&value)
    }
}

impl From<std::io::Error> for RawError {
    fn from(value: std::io::Error) -> Self {
        RawError::from_error(&value)
    }
}

impl From<ErrorRecord> for RawError {
    fn from(record: ErrorRecord) -> Self {
        RawError {
            code: Some(record.code),
            ..record.original
        }
    }
}

/// Result of classifying a caught error. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ErrorRecord {
    code: ErrorCode,
    message: String,
    original: RawError,
    retryable: bool,
    severity: Severity,
    /// Milliseconds since the Unix epoch
    timestamp: i64,
}

impl ErrorRecord {
    /// Build a record stamped with the current time
    pub fn new(code: ErrorCode, original: RawError) -> Self {
        Self::at(code, original, crate::utils::now_ms())
    }

    pub fn at(code: ErrorCode, original: RawError, timestamp: i64) -> Self {
        let info = code.info();
        let original = RawError {
            code: None,
            ..original
        };
        Self {
            code,
            message: info.message.to_string(),
            original,
            retryable: info.retryable,
            severity: info.severity,
            timestamp,
        }
    }

    /// Same record, marked terminal regardless of what the table says
    pub fn terminal(mut self) -> Self {
        self.retryable = false;
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn original(&self) -> &RawError {
        &self.original
    }

    pub fn retryable(&self) -> bool {
        self.retryable
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn info(&self) -> &'static ErrorInfo {
        self.code.info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("handshake aborted")]
    struct HandshakeError {
        #[source]
        cause: std::io::Error,
    }

    #[test]
    fn test_from_error_walks_source_chain() {
        let err = HandshakeError {
            cause: std::io::Error::new(std::io::ErrorKind::Other, "certificate expired"),
        };
        let raw = RawError::from_error(&err);
        assert_eq!(raw.name.as_deref(), Some("HandshakeError"));
        assert_eq!(raw.message, "handshake aborted: certificate expired");
    }

    #[test]
    fn test_from_dyn_error_has_no_name() {
        let err: Box<dyn std::error::Error> = "boom".into();
        let raw = RawError::from_error(err.as_ref());
        assert_eq!(raw.name, None);
        assert_eq!(raw.message, "boom");
    }

    #[test]
    fn test_from_value_object_with_message() {
        let raw = RawError::from_value(&json!({
            "name": "WalletSignTransactionError",
            "message": "User rejected the request."
        }));
        assert_eq!(raw.name.as_deref(), Some("WalletSignTransactionError"));
        assert_eq!(
            raw.haystack(),
            "walletsigntransactionerror user rejected the request."
        );
    }

    #[test]
    fn test_from_value_plain_object_is_stringified() {
        let raw = RawError::from_value(&json!({ "status": 503 }));
        assert_eq!(raw.name, None);
        assert_eq!(raw.message, r#"{"status":503}"#);
        assert_eq!(RawError::from_value(&json!(42)).message, "42");
        assert_eq!(RawError::from_value(&Value::Null).message, "");
    }

    #[test]
    fn test_record_takes_table_values() {
        let record = ErrorRecord::at(ErrorCode::RateLimited, RawError::new("429"), 1_700);
        assert_eq!(record.code(), ErrorCode::RateLimited);
        assert!(record.retryable());
        assert_eq!(record.severity(), Severity::Warning);
        assert_eq!(record.timestamp(), 1_700);
        assert_eq!(record.message(), ErrorCode::RateLimited.info().message);
        assert_eq!(record.original().message, "429");
        assert!(record.to_string().starts_with("RATE_LIMITED: "));
    }

    #[test]
    fn test_record_round_trips_through_raw_error() {
        let record = ErrorRecord::at(ErrorCode::ProofTimeout, RawError::new("prover stalled"), 5);
        let raw: RawError = record.clone().into();
        assert_eq!(raw.code, Some(ErrorCode::ProofTimeout));
        assert_eq!(raw.message, "prover stalled");
        assert_eq!(record.original().code, None);
    }

    #[test]
    fn test_terminal_overrides_retryable() {
        let record = ErrorRecord::at(ErrorCode::RpcUnavailable, RawError::default(), 0).terminal();
        assert!(!record.retryable());
    }
}
