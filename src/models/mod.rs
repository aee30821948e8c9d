//! # Domain Models
//!
//! Plain data shared by every resilience component.
//!
//! - [`ErrorCode`] and its static [`ErrorInfo`] table: the closed taxonomy of
//!   failures, each with fixed title, message, action, severity and
//!   retryability. The same fault always produces the same text.
//! - [`RawError`] / [`ErrorRecord`]: a caught value before and after
//!   classification. Records are immutable and never persisted.
//! - [`EndpointDescriptor`] / [`NetworkId`]: entries of the read-only
//!   endpoint catalog built at startup.

pub mod endpoint;
pub mod error_code;
pub mod error_record;

pub use endpoint::{EndpointDescriptor, NetworkId};
pub use error_code::{ErrorCode, ErrorDomain, ErrorInfo, Severity};
pub use error_record::{ErrorRecord, RawError};
