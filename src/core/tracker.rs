//! Connection state tracking
//!
//! State is a plain value advanced by a pure transition function
//! (`state.apply(event) -> state`). [`Tracker`] wraps any such state in a
//! `tokio::sync::watch` channel so renderers can subscribe to changes without
//! the state machine knowing about them.
//!
//! Timestamps are milliseconds since the Unix epoch and are always supplied by
//! the caller, which keeps transitions deterministic under test.

use crate::models::{EndpointDescriptor, ErrorCode, ErrorRecord, RawError};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// A state advanced by events
pub trait Transition: Clone + Send + Sync + 'static {
    type Event;

    /// Next state. Events that make no sense in the current state leave it unchanged.
    fn apply(self, event: Self::Event) -> Self;
}

/// Observable holder for a [`Transition`] state
#[derive(Debug)]
pub struct Tracker<S: Transition> {
    tx: watch::Sender<S>,
}

impl<S: Transition> Tracker<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Apply `event` and notify subscribers. Returns the new state.
    pub fn dispatch(&self, event: S::Event) -> S {
        self.tx.send_modify(|state| {
            let previous = state.clone();
            *state = previous.apply(event);
        });
        self.current()
    }

    pub fn current(&self) -> S {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Retrying,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// An attempt is running or scheduled
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ConnectionStatus::Connecting | ConnectionStatus::Retrying)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Begin (or re-begin after a terminal state) against `endpoint`
    Start {
        endpoint: Option<EndpointDescriptor>,
        at: i64,
    },
    /// An attempt failed. `retrying` is false when no further attempt follows.
    AttemptFailed {
        error: ErrorRecord,
        retrying: bool,
        at: i64,
    },
    /// Retries on the current endpoint are exhausted; continue on another one
    SwitchEndpoint { endpoint: EndpointDescriptor, at: i64 },
    Connected { at: i64 },
    /// The stage deadline passed before any other transition
    StageTimedOut { at: i64 },
    Reset,
}

/// Per-operation connection state
///
/// `status == Error` always carries a `last_error`, and `attempt_count`
/// never exceeds `max_attempts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionState {
    attempt_count: u32,
    max_attempts: u32,
    status: ConnectionStatus,
    last_error: Option<ErrorRecord>,
    current_endpoint: Option<EndpointDescriptor>,
    started_at: Option<i64>,
    stage_started_at: Option<i64>,
}

impl ConnectionState {
    /// Idle state for a sequence of at most `max_retries + 1` attempts
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempt_count: 0,
            max_attempts: max_retries.saturating_add(1),
            status: ConnectionStatus::Idle,
            last_error: None,
            current_endpoint: None,
            started_at: None,
            stage_started_at: None,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.last_error.as_ref()
    }

    pub fn current_endpoint(&self) -> Option<&EndpointDescriptor> {
        self.current_endpoint.as_ref()
    }

    /// Milliseconds since the flow started
    pub fn elapsed(&self, now: i64) -> Option<i64> {
        self.started_at.map(|t| now.saturating_sub(t).max(0))
    }

    /// Milliseconds spent in the current status
    pub fn stage_elapsed(&self, now: i64) -> Option<i64> {
        self.stage_started_at.map(|t| now.saturating_sub(t).max(0))
    }

    /// Whether an in-flight stage has overrun `limit`
    pub fn timed_out(&self, now: i64, limit: Duration) -> bool {
        self.status.is_in_flight()
            && self
                .stage_elapsed(now)
                .is_some_and(|ms| ms as u128 >= limit.as_millis())
    }

    fn fail(mut self, error: ErrorRecord, at: i64) -> Self {
        self.status = ConnectionStatus::Error;
        self.last_error = Some(error);
        self.stage_started_at = Some(at);
        self
    }
}

impl Transition for ConnectionState {
    type Event = ConnectionEvent;

    fn apply(mut self, event: ConnectionEvent) -> Self {
        match event {
            ConnectionEvent::Start { endpoint, at } if !self.status.is_in_flight() => Self {
                attempt_count: 1,
                status: ConnectionStatus::Connecting,
                last_error: None,
                current_endpoint: endpoint,
                started_at: Some(at),
                stage_started_at: Some(at),
                ..self
            },
            ConnectionEvent::AttemptFailed {
                error,
                retrying,
                at,
            } if self.status.is_in_flight() => {
                if retrying && self.attempt_count < self.max_attempts {
                    self.attempt_count += 1;
                    self.status = ConnectionStatus::Retrying;
                    self.last_error = Some(error);
                    self.stage_started_at = Some(at);
                    self
                } else {
                    self.fail(error, at)
                }
            }
            ConnectionEvent::SwitchEndpoint { endpoint, at } if self.status.is_in_flight() => {
                self.attempt_count = 1;
                self.status = ConnectionStatus::Connecting;
                self.current_endpoint = Some(endpoint);
                self.stage_started_at = Some(at);
                self
            }
            ConnectionEvent::Connected { at } if self.status.is_in_flight() => {
                self.status = ConnectionStatus::Connected;
                self.stage_started_at = Some(at);
                self
            }
            ConnectionEvent::StageTimedOut { at } if self.status.is_in_flight() => {
                let raw = RawError::new(format!(
                    "{:?} stage exceeded its deadline",
                    self.status
                ))
                .with_name("StageTimeout");
                self.fail(ErrorRecord::at(ErrorCode::Timeout, raw, at), at)
            }
            ConnectionEvent::Reset => Self::new(self.max_attempts - 1),
            _ => self,
        }
    }
}

/// Race `fut` against a timer
///
/// If `limit` elapses first, `fut` is dropped (the underlying request is
/// abandoned, not cancelled remotely) and a `code` record naming `stage` is
/// returned instead.
pub async fn with_stage_timeout<T, F>(
    limit: Duration,
    code: ErrorCode,
    stage: &str,
    fut: F,
) -> Result<T, ErrorRecord>
where
    F: Future<Output = Result<T, ErrorRecord>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(stage, ?limit, "stage timed out");
            let raw = RawError::new(format!("{stage} did not finish within {limit:?}"))
                .with_name("StageTimeout");
            Err(ErrorRecord::new(code, raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NetworkId;

    fn endpoint(id: &str) -> EndpointDescriptor {
        EndpointDescriptor::new(id, format!("https://{id}.example"), NetworkId::Devnet, 0)
    }

    fn failure(at: i64) -> ErrorRecord {
        ErrorRecord::at(ErrorCode::Timeout, RawError::new("timeout"), at)
    }

    fn started() -> ConnectionState {
        ConnectionState::new(2).apply(ConnectionEvent::Start {
            endpoint: Some(endpoint("a")),
            at: 1_000,
        })
    }

    #[test]
    fn test_start_enters_connecting() {
        let state = started();
        assert_eq!(state.status(), ConnectionStatus::Connecting);
        assert_eq!(state.attempt_count(), 1);
        assert_eq!(state.current_endpoint().unwrap().id, "a");
        assert_eq!(state.elapsed(1_250), Some(250));
    }

    #[test]
    fn test_retry_counts_and_caps_attempts() {
        let mut state = started();
        for at in [1_100, 1_200] {
            state = state.apply(ConnectionEvent::AttemptFailed {
                error: failure(at),
                retrying: true,
                at,
            });
            assert_eq!(state.status(), ConnectionStatus::Retrying);
        }
        assert_eq!(state.attempt_count(), 3);

        // A further "retrying" failure beyond the budget is terminal
        let state = state.apply(ConnectionEvent::AttemptFailed {
            error: failure(1_300),
            retrying: true,
            at: 1_300,
        });
        assert_eq!(state.status(), ConnectionStatus::Error);
        assert_eq!(state.attempt_count(), 3);
        assert!(state.attempt_count() <= state.max_attempts());
    }

    #[test]
    fn test_error_always_has_last_error() {
        let state = started().apply(ConnectionEvent::AttemptFailed {
            error: failure(1_100),
            retrying: false,
            at: 1_100,
        });
        assert_eq!(state.status(), ConnectionStatus::Error);
        assert_eq!(state.last_error().unwrap().code(), ErrorCode::Timeout);

        let timed_out = started().apply(ConnectionEvent::StageTimedOut { at: 20_000 });
        assert_eq!(timed_out.status(), ConnectionStatus::Error);
        let error = timed_out.last_error().unwrap();
        assert_eq!(error.code(), ErrorCode::Timeout);
        assert_eq!(error.timestamp(), 20_000);
    }

    #[test]
    fn test_connected_and_restart() {
        let state = started().apply(ConnectionEvent::Connected { at: 1_500 });
        assert_eq!(state.status(), ConnectionStatus::Connected);

        // Events for in-flight attempts are ignored once terminal
        let same = state.clone().apply(ConnectionEvent::StageTimedOut { at: 99_000 });
        assert_eq!(same, state);

        let restarted = state.apply(ConnectionEvent::Start {
            endpoint: Some(endpoint("b")),
            at: 2_000,
        });
        assert_eq!(restarted.status(), ConnectionStatus::Connecting);
        assert_eq!(restarted.attempt_count(), 1);
        assert!(restarted.last_error().is_none());
    }

    #[test]
    fn test_start_ignored_while_in_flight() {
        let state = started();
        let same = state.clone().apply(ConnectionEvent::Start {
            endpoint: Some(endpoint("b")),
            at: 1_001,
        });
        assert_eq!(same, state);
    }

    #[test]
    fn test_switch_endpoint_resets_attempts() {
        let state = started()
            .apply(ConnectionEvent::AttemptFailed {
                error: failure(1_100),
                retrying: true,
                at: 1_100,
            })
            .apply(ConnectionEvent::SwitchEndpoint {
                endpoint: endpoint("b"),
                at: 1_200,
            });
        assert_eq!(state.status(), ConnectionStatus::Connecting);
        assert_eq!(state.attempt_count(), 1);
        assert_eq!(state.current_endpoint().unwrap().id, "b");
        assert!(state.last_error().is_some());
    }

    #[test]
    fn test_timed_out_only_in_flight() {
        let state = started();
        assert!(!state.timed_out(1_999, Duration::from_secs(1)));
        assert!(state.timed_out(2_000, Duration::from_secs(1)));
        assert!(!ConnectionState::new(0).timed_out(50_000, Duration::from_secs(1)));
    }

    #[test]
    fn test_reset_keeps_budget() {
        let state = started().apply(ConnectionEvent::Reset);
        assert_eq!(state, ConnectionState::new(2));
    }

    #[tokio::test]
    async fn test_tracker_publishes_to_subscribers() {
        let tracker = Tracker::new(ConnectionState::new(1));
        let mut rx = tracker.subscribe();

        tracker.dispatch(ConnectionEvent::Start {
            endpoint: None,
            at: 0,
        });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status(), ConnectionStatus::Connecting);

        let state = tracker.dispatch(ConnectionEvent::Connected { at: 10 });
        assert_eq!(state.status(), ConnectionStatus::Connected);
        assert_eq!(tracker.current().status(), ConnectionStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_timeout_abandons_slow_future() {
        let result: Result<(), ErrorRecord> = with_stage_timeout(
            Duration::from_millis(50),
            ErrorCode::Timeout,
            "connecting",
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
        )
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Timeout);
        assert_eq!(err.original().name.as_deref(), Some("StageTimeout"));
    }

    #[tokio::test]
    async fn test_stage_timeout_passes_through_result() {
        let ok = with_stage_timeout(Duration::from_secs(1), ErrorCode::Timeout, "x", async {
            Ok::<_, ErrorRecord>(7)
        })
        .await;
        assert_eq!(ok, Ok(7));
    }
}
