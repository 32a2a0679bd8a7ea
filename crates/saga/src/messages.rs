//! Interaction channels into a running saga.

use crate::gate::{AddressUpdateGate, UpdateRejected};
use crate::progress::{ProgressSnapshot, ProgressTracker};

/// The channels a caller can use while a saga runs: a synchronous
/// progress query, a fire-and-forget address-correction signal, and a
/// validated synchronous address update.
///
/// Handles are cheap to clone and stay valid for the saga's lifetime.
#[derive(Debug, Clone)]
pub struct SagaHandle {
    tracker: ProgressTracker,
    gate: AddressUpdateGate,
}

impl SagaHandle {
    pub(crate) fn new(tracker: ProgressTracker, gate: AddressUpdateGate) -> Self {
        Self { tracker, gate }
    }

    /// Query: current progress, 0-100.
    pub fn progress(&self) -> u8 {
        self.tracker.progress()
    }

    /// Query: latest committed progress/status pair.
    pub fn query(&self) -> ProgressSnapshot {
        self.tracker.query()
    }

    /// Signal: fire-and-forget address correction. No acknowledgement,
    /// no validation.
    pub fn signal_update_order(&self, address: impl Into<String>) {
        self.gate.signal(address);
    }

    /// Update: validated address correction. Returns the confirmation on
    /// commit, or a rejection that left the saga untouched.
    pub fn update_order(&self, address: &str) -> Result<String, UpdateRejected> {
        self.gate.update(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> SagaHandle {
        SagaHandle::new(ProgressTracker::new(), AddressUpdateGate::new())
    }

    #[test]
    fn test_query_reflects_tracker_state() {
        let h = handle();
        assert_eq!(h.progress(), 0);
        assert_eq!(h.query(), ProgressSnapshot::default());
    }

    #[test]
    fn test_update_is_validated_and_signal_is_not() {
        let h = handle();
        assert!(h.update_order("Main St").is_err());

        h.signal_update_order("Main St");
        assert_eq!(
            h.update_order("5 Main St").unwrap(),
            "Updated address: 5 Main St"
        );
    }
}
