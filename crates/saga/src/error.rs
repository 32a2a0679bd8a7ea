//! Saga error types.

use thiserror::Error;

use crate::invoker::{FailureKind, StepFailure};

/// Errors that can occur during saga execution.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A forward or compensating step failed. The underlying failure keeps
    /// its retryable/non-retryable classification.
    #[error("step '{step}' failed after {attempts} attempt(s): {source}")]
    Step {
        step: &'static str,
        attempts: u32,
        #[source]
        source: StepFailure,
    },

    /// A single item's shipment failed during fan-out.
    #[error("shipment failed for item {item_id}")]
    Shipment {
        item_id: i64,
        #[source]
        source: Box<SagaError>,
    },

    /// A child shipping saga ended without producing a result.
    #[error("child saga '{id}' terminated: {reason}")]
    ChildTerminated { id: String, reason: String },

    /// Deliberate defect injected by the recoverable-failure variant.
    #[error("simulated defect injected before shipping")]
    InjectedFault,

    /// Visibility index error.
    #[error("visibility index error: {0}")]
    Visibility(String),
}

impl SagaError {
    /// Returns the preserved failure classification, when one applies.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            SagaError::Step { source, .. } => Some(source.kind),
            SagaError::Shipment { source, .. } => source.failure_kind(),
            _ => None,
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
