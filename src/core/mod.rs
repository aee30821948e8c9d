//! Core resilience logic (UI-agnostic)
//!
//! CRITICAL: This module MUST NOT depend on any UI framework. Renderers observe
//! state through [`Tracker::subscribe`] only.

pub mod classifier;
pub mod endpoints;
pub mod proof;
pub mod runner;
pub mod tracker;

// Test utilities for scripted RPC nodes (tests only)
#[cfg(test)]
pub mod mock_rpc;

pub use classifier::{
    AlwaysOnline, Classifier, ConnectivityProbe, Matcher, OnlineFlag, Rule, DEFAULT_RULES,
};
pub use endpoints::{next_endpoint, EndpointCatalog};
pub use proof::{ProofEvent, ProofStage, ProofState, StageTimeouts};
pub use runner::ResilientRunner;
pub use tracker::{
    with_stage_timeout, ConnectionEvent, ConnectionState, ConnectionStatus, Tracker, Transition,
};
