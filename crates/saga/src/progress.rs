//! Saga progress tracking.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// A committed progress/status pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProgressSnapshot {
    /// Percent complete, 0-100.
    pub progress: u8,
    /// The most recently entered step.
    pub status: String,
}

/// Tracks the current progress and status of one saga run.
///
/// The controller is the only writer; queries are safe at any time,
/// including concurrently with in-flight steps, and always see the latest
/// committed pair. Progress never decreases within a run: a regressing
/// write keeps the prior value and records the new status.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<RwLock<ProgressSnapshot>>,
}

impl ProgressTracker {
    /// Creates a tracker at progress 0 with an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest committed progress/status pair.
    pub fn query(&self) -> ProgressSnapshot {
        self.inner.read().unwrap().clone()
    }

    /// Returns the current progress percentage.
    pub fn progress(&self) -> u8 {
        self.inner.read().unwrap().progress
    }

    /// Commits a new status and progress value. Called only by the saga
    /// controller.
    pub fn advance(&self, status: impl Into<String>, progress: u8) {
        let mut state = self.inner.write().unwrap();
        let status = status.into();
        if progress < state.progress {
            tracing::warn!(
                current = state.progress,
                requested = progress,
                %status,
                "ignoring progress regression"
            );
            state.status = status;
            return;
        }
        state.progress = progress;
        state.status = status;
    }
}
