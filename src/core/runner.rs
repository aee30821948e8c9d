//! Resilient operation runner
//!
//! Drives one logical operation (fetch a balance, submit a transaction)
//! through the retry controller, falling back to the next endpoint of the
//! network once retries against the current one are exhausted. Every
//! transition is published to a [`Tracker`] for rendering.

use super::classifier::Classifier;
use super::endpoints::{next_endpoint, EndpointCatalog};
use super::tracker::{with_stage_timeout, ConnectionEvent, ConnectionState, Tracker};
use crate::constants::CONNECT_TIMEOUT_MS;
use crate::models::{EndpointDescriptor, ErrorCode, ErrorRecord, NetworkId, RawError};
use crate::utils::now_ms;
use crate::utils::retry::{retry_with_backoff, RetryConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Shared, read-only collaborators for running operations
#[derive(Debug, Clone)]
pub struct ResilientRunner {
    catalog: Arc<EndpointCatalog>,
    config: Arc<RetryConfig>,
    classifier: Arc<Classifier>,
    fallback_enabled: bool,
    connect_timeout: Duration,
}

impl ResilientRunner {
    pub fn new(
        catalog: Arc<EndpointCatalog>,
        config: Arc<RetryConfig>,
        classifier: Arc<Classifier>,
    ) -> Self {
        Self {
            catalog,
            config,
            classifier,
            fallback_enabled: true,
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
        }
    }

    /// Stay on the first endpoint instead of rotating through the catalog
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    /// Deadline for a single attempt. An attempt that overruns it fails
    /// with `TIMEOUT` and goes through the retry policy like any other.
    pub fn with_connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = limit;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn catalog(&self) -> &EndpointCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Idle tracker sized for this runner's retry budget
    pub fn tracker(&self) -> Tracker<ConnectionState> {
        Tracker::new(ConnectionState::new(self.config.max_retries))
    }

    /// Run `op` against endpoints of `network`
    ///
    /// Each endpoint gets one full retry sequence. Non-retryable failures
    /// stop immediately; retryable ones move on to the next endpoint until
    /// every endpoint of the network has been tried once. An attempt that
    /// does not settle within the connect timeout counts as a `TIMEOUT`
    /// failure and its future is dropped. With no endpoint
    /// for `network`, returns a terminal `RPC_UNAVAILABLE` record without
    /// calling `op`.
    pub async fn run<T, E, F, Fut>(
        &self,
        network: NetworkId,
        tracker: &Tracker<ConnectionState>,
        mut op: F,
    ) -> Result<T, ErrorRecord>
    where
        F: FnMut(&EndpointDescriptor) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawError>,
    {
        let endpoints = self.catalog.endpoints();
        let Some(mut endpoint) = next_endpoint(None, network, endpoints) else {
            let record = ErrorRecord::new(
                ErrorCode::RpcUnavailable,
                RawError::new(format!("no endpoints configured for {network}")),
            )
            .terminal();
            tracker.dispatch(ConnectionEvent::Start {
                endpoint: None,
                at: now_ms(),
            });
            tracker.dispatch(ConnectionEvent::AttemptFailed {
                error: record.clone(),
                retrying: false,
                at: record.timestamp(),
            });
            return Err(record);
        };

        let hops = if self.fallback_enabled {
            self.catalog.for_network(network).len()
        } else {
            1
        };

        tracker.dispatch(ConnectionEvent::Start {
            endpoint: Some(endpoint.clone()),
            at: now_ms(),
        });

        let classifier = &*self.classifier;
        let limit = self.connect_timeout;

        let mut hop = 1;
        loop {
            tracing::debug!(endpoint = %endpoint.id, hop, hops, "running operation");

            let result = retry_with_backoff(
                &self.config,
                &self.classifier,
                || {
                    let attempt = op(endpoint);
                    with_stage_timeout(limit, ErrorCode::Timeout, "connecting", async move {
                        attempt.await.map_err(|e| classifier.record(e.into()))
                    })
                },
                |_, error, _| {
                    tracker.dispatch(ConnectionEvent::AttemptFailed {
                        error: error.clone(),
                        retrying: true,
                        at: now_ms(),
                    });
                },
            )
            .await;

            let error = match result {
                Ok(value) => {
                    tracker.dispatch(ConnectionEvent::Connected { at: now_ms() });
                    return Ok(value);
                }
                Err(error) => error,
            };

            let next = if hop < hops && self.config.is_retryable(error.code()) {
                next_endpoint(Some(endpoint), network, endpoints)
            } else {
                None
            };

            match next {
                Some(next) => {
                    tracing::warn!(
                        from = %endpoint.id,
                        to = %next.id,
                        code = %error.code(),
                        "falling back to next endpoint"
                    );
                    tracker.dispatch(ConnectionEvent::SwitchEndpoint {
                        endpoint: next.clone(),
                        at: now_ms(),
                    });
                    endpoint = next;
                    hop += 1;
                }
                None => {
                    tracker.dispatch(ConnectionEvent::AttemptFailed {
                        error: error.clone(),
                        retrying: false,
                        at: now_ms(),
                    });
                    return Err(error);
                }
            }
        }
    }
}
