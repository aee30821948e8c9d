//! mixer-resilience - network resilience layer for a privacy-mixer client
//!
//! Classifies failures into a closed error taxonomy, retries transient ones
//! with exponential backoff, rotates through fallback RPC endpoints and
//! tracks connection and proof-generation progress for rendering.

// Public modules
pub mod config;
pub mod constants;
pub mod core;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod utils;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::core::{
    next_endpoint, Classifier, ConnectionState, EndpointCatalog, ProofStage, ProofState,
    ResilientRunner, Tracker,
};
pub use crate::models::{EndpointDescriptor, ErrorCode, ErrorRecord, NetworkId, RawError};
pub use crate::utils::{retry_with_backoff, ConfigError, RetryConfig, ValidationError};
