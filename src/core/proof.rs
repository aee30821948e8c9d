//! Proof flow state tracking
//!
//! Proving itself happens in an external library; this module only records
//! which stage the flow is in, how long it has been there, and why it
//! failed. Stages only move forward.

use super::classifier::Classifier;
use super::tracker::{Tracker, Transition};
use crate::constants::{
    GENERATING_PROOF_TIMEOUT_MS, GENERATING_WITNESS_TIMEOUT_MS, LOADING_CIRCUIT_TIMEOUT_MS,
    SUBMITTING_TIMEOUT_MS, VERIFYING_TIMEOUT_MS,
};
use crate::models::{ErrorCode, ErrorRecord, RawError};
use crate::utils::now_ms;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStage {
    Idle,
    LoadingCircuit,
    GeneratingWitness,
    GeneratingProof,
    Verifying,
    Submitting,
    Complete,
    Error,
}

impl ProofStage {
    /// Position in the forward flow. `Idle` and `Error` sit outside it.
    fn order(&self) -> Option<u8> {
        match self {
            ProofStage::LoadingCircuit => Some(0),
            ProofStage::GeneratingWitness => Some(1),
            ProofStage::GeneratingProof => Some(2),
            ProofStage::Verifying => Some(3),
            ProofStage::Submitting => Some(4),
            ProofStage::Complete => Some(5),
            ProofStage::Idle | ProofStage::Error => None,
        }
    }

    /// A stage with work in progress
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ProofStage::Idle | ProofStage::Complete | ProofStage::Error
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProofStage::Complete | ProofStage::Error)
    }

    pub fn next(&self) -> Option<ProofStage> {
        match self {
            ProofStage::LoadingCircuit => Some(ProofStage::GeneratingWitness),
            ProofStage::GeneratingWitness => Some(ProofStage::GeneratingProof),
            ProofStage::GeneratingProof => Some(ProofStage::Verifying),
            ProofStage::Verifying => Some(ProofStage::Submitting),
            ProofStage::Submitting => Some(ProofStage::Complete),
            _ => None,
        }
    }

    /// Progress bar percentage shown while in this stage
    pub fn progress(&self) -> u8 {
        match self {
            ProofStage::Idle | ProofStage::Error => 0,
            ProofStage::LoadingCircuit => 10,
            ProofStage::GeneratingWitness => 25,
            ProofStage::GeneratingProof => 50,
            ProofStage::Verifying => 80,
            ProofStage::Submitting => 90,
            ProofStage::Complete => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProofStage::Idle => "Ready",
            ProofStage::LoadingCircuit => "Loading circuit",
            ProofStage::GeneratingWitness => "Computing witness",
            ProofStage::GeneratingProof => "Generating proof",
            ProofStage::Verifying => "Verifying proof",
            ProofStage::Submitting => "Submitting transaction",
            ProofStage::Complete => "Complete",
            ProofStage::Error => "Failed",
        }
    }
}

/// Per-stage deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub loading_circuit: Duration,
    pub generating_witness: Duration,
    pub generating_proof: Duration,
    pub verifying: Duration,
    pub submitting: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            loading_circuit: Duration::from_millis(LOADING_CIRCUIT_TIMEOUT_MS),
            generating_witness: Duration::from_millis(GENERATING_WITNESS_TIMEOUT_MS),
            generating_proof: Duration::from_millis(GENERATING_PROOF_TIMEOUT_MS),
            verifying: Duration::from_millis(VERIFYING_TIMEOUT_MS),
            submitting: Duration::from_millis(SUBMITTING_TIMEOUT_MS),
        }
    }
}

impl StageTimeouts {
    /// Deadline for an active stage; `None` for idle and terminal stages
    pub fn for_stage(&self, stage: ProofStage) -> Option<Duration> {
        match stage {
            ProofStage::LoadingCircuit => Some(self.loading_circuit),
            ProofStage::GeneratingWitness => Some(self.generating_witness),
            ProofStage::GeneratingProof => Some(self.generating_proof),
            ProofStage::Verifying => Some(self.verifying),
            ProofStage::Submitting => Some(self.submitting),
            ProofStage::Idle | ProofStage::Complete | ProofStage::Error => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProofEvent {
    Start { at: i64 },
    Advance { stage: ProofStage, at: i64 },
    Failed { error: ErrorRecord, at: i64 },
    StageTimedOut { at: i64 },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProofState {
    stage: ProofStage,
    /// Stage that was active when the flow failed
    failed_stage: Option<ProofStage>,
    last_error: Option<ErrorRecord>,
    started_at: Option<i64>,
    stage_started_at: Option<i64>,
}

impl Default for ProofState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofState {
    pub fn new() -> Self {
        Self {
            stage: ProofStage::Idle,
            failed_stage: None,
            last_error: None,
            started_at: None,
            stage_started_at: None,
        }
    }

    pub fn stage(&self) -> ProofStage {
        self.stage
    }

    pub fn failed_stage(&self) -> Option<ProofStage> {
        self.failed_stage
    }

    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.last_error.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.stage.progress()
    }

    pub fn elapsed(&self, now: i64) -> Option<i64> {
        self.started_at.map(|t| now.saturating_sub(t).max(0))
    }

    pub fn stage_elapsed(&self, now: i64) -> Option<i64> {
        self.stage_started_at.map(|t| now.saturating_sub(t).max(0))
    }

    /// Whether the current stage has overrun its deadline
    pub fn timed_out(&self, now: i64, timeouts: &StageTimeouts) -> bool {
        match (timeouts.for_stage(self.stage), self.stage_elapsed(now)) {
            (Some(limit), Some(ms)) => ms as u128 >= limit.as_millis(),
            _ => false,
        }
    }

    fn fail(mut self, error: ErrorRecord, at: i64) -> Self {
        self.failed_stage = Some(self.stage);
        self.stage = ProofStage::Error;
        self.last_error = Some(error);
        self.stage_started_at = Some(at);
        self
    }
}

impl Transition for ProofState {
    type Event = ProofEvent;

    fn apply(mut self, event: ProofEvent) -> Self {
        match event {
            ProofEvent::Start { at } if !self.stage.is_active() => Self {
                stage: ProofStage::LoadingCircuit,
                failed_stage: None,
                last_error: None,
                started_at: Some(at),
                stage_started_at: Some(at),
            },
            ProofEvent::Advance { stage, at } if self.stage.is_active() => {
                match (self.stage.order(), stage.order()) {
                    (Some(from), Some(to)) if to > from => {
                        self.stage = stage;
                        self.stage_started_at = Some(at);
                        self
                    }
                    _ => self,
                }
            }
            ProofEvent::Failed { error, at } if self.stage.is_active() => self.fail(error, at),
            ProofEvent::StageTimedOut { at } if self.stage.is_active() => {
                let raw = RawError::new(format!("{} exceeded its deadline", self.stage.label()))
                    .with_name("StageTimeout");
                self.fail(ErrorRecord::at(ErrorCode::ProofTimeout, raw, at), at)
            }
            ProofEvent::Reset => Self::new(),
            _ => self,
        }
    }
}

impl Tracker<ProofState> {
    /// Run the work of one stage under that stage's deadline
    ///
    /// Enters `stage` first, starting a new flow if the current one is idle
    /// or finished. If `fut` fails, its error is classified and recorded
    /// with `Failed`. If the deadline passes first, `fut` is dropped and
    /// the flow moves to `Error` through `StageTimedOut`. On success the
    /// flow stays in `stage`; the caller advances it.
    pub async fn run_stage<T, E, F>(
        &self,
        stage: ProofStage,
        timeouts: &StageTimeouts,
        classifier: &Classifier,
        fut: F,
    ) -> Result<T, ErrorRecord>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<RawError>,
    {
        if !self.current().stage().is_active() {
            self.dispatch(ProofEvent::Start { at: now_ms() });
        }
        if self.current().stage() != stage {
            self.dispatch(ProofEvent::Advance {
                stage,
                at: now_ms(),
            });
        }

        let outcome = match timeouts.for_stage(stage) {
            Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
            None => Some(fut.await),
        };

        match outcome {
            Some(Ok(value)) => Ok(value),
            Some(Err(err)) => {
                let record = classifier.record(err.into());
                tracing::warn!(stage = stage.label(), code = %record.code(), "proof stage failed");
                self.dispatch(ProofEvent::Failed {
                    error: record.clone(),
                    at: record.timestamp(),
                });
                Err(record)
            }
            None => {
                tracing::warn!(stage = stage.label(), "proof stage timed out");
                let state = self.dispatch(ProofEvent::StageTimedOut { at: now_ms() });
                Err(state.last_error().cloned().unwrap_or_else(|| {
                    let raw = RawError::new(format!("{} exceeded its deadline", stage.label()))
                        .with_name("StageTimeout");
                    ErrorRecord::new(ErrorCode::ProofTimeout, raw)
                }))
            }
        }
    }
}
