//! Human-in-the-loop address corrections.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

/// Why a validated address update was rejected before commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpdateRejected {
    #[error("Address can not be blank")]
    BlankAddress,
    #[error("Address must start with a digit")]
    NoLeadingDigit,
}

/// Accepts address corrections for a running saga and gates continuation
/// on them.
///
/// Two channels feed the gate: a fire-and-forget signal that overwrites
/// the pending address unconditionally, and a validated update that is
/// rejected before commit if the address is malformed. A later correction
/// overwrites an earlier one until the saga consumes the value. Clones
/// share the same pending address.
#[derive(Debug, Clone)]
pub struct AddressUpdateGate {
    pending: watch::Sender<String>,
}

impl AddressUpdateGate {
    /// Creates a gate with no pending correction.
    pub fn new() -> Self {
        let (pending, _) = watch::channel(String::new());
        Self { pending }
    }

    /// Fire-and-forget correction: overwrites the pending address with no
    /// validation and no acknowledgement.
    pub fn signal(&self, address: impl Into<String>) {
        let address = address.into();
        tracing::info!(%address, "received address correction signal");
        self.pending.send_replace(address);
    }

    /// Validated correction: the address is checked before it is applied.
    /// A rejected update leaves the pending address untouched. On success
    /// the committed address is acknowledged.
    pub fn update(&self, address: &str) -> Result<String, UpdateRejected> {
        validate_address(address)?;
        tracing::info!(%address, "committing validated address update");
        self.pending.send_replace(address.to_string());
        Ok(format!("Updated address: {address}"))
    }

    /// Returns the pending correction, if one has been delivered.
    pub fn pending(&self) -> Option<String> {
        let current = self.pending.borrow();
        if current.is_empty() {
            None
        } else {
            Some(current.clone())
        }
    }

    /// Suspends until a correction arrives or `timeout` elapses. A
    /// correction delivered before the wait began is returned immediately.
    /// Timing out is a normal outcome, not an error: the caller proceeds
    /// with its last known-good address.
    pub async fn wait_for_update(&self, timeout: Duration) -> Option<String> {
        let mut rx = self.pending.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(|address| !address.is_empty())).await {
            Ok(Ok(address)) => Some(address.clone()),
            _ => None,
        }
    }
}

impl Default for AddressUpdateGate {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_address(address: &str) -> Result<(), UpdateRejected> {
    match address.chars().next() {
        None => Err(UpdateRejected::BlankAddress),
        Some(first) if first.is_ascii_digit() => Ok(()),
        Some(_) => Err(UpdateRejected::NoLeadingDigit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_update_is_acknowledged() {
        let gate = AddressUpdateGate::new();
        let ack = gate.update("5 Main St").unwrap();
        assert_eq!(ack, "Updated address: 5 Main St");
        assert_eq!(gate.pending(), Some("5 Main St".to_string()));
    }

    #[test]
    fn test_blank_address_rejected_before_commit() {
        let gate = AddressUpdateGate::new();
        assert_eq!(gate.update(""), Err(UpdateRejected::BlankAddress));
        assert_eq!(gate.pending(), None);
    }

    #[test]
    fn test_non_digit_address_rejected_before_commit() {
        let gate = AddressUpdateGate::new();
        gate.signal("10 Elm St");

        assert_eq!(gate.update("Main St"), Err(UpdateRejected::NoLeadingDigit));
        // A rejected update must not disturb the pending correction.
        assert_eq!(gate.pending(), Some("10 Elm St".to_string()));
    }

    #[test]
    fn test_signal_overwrites_unconditionally() {
        let gate = AddressUpdateGate::new();
        gate.signal("5 Main St");
        gate.signal("not validated at all");
        assert_eq!(gate.pending(), Some("not validated at all".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_without_correction() {
        let gate = AddressUpdateGate::new();
        let started = tokio::time::Instant::now();

        let result = gate.wait_for_update(Duration::from_secs(60)).await;

        assert_eq!(result, None);
        assert!(started.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_promptly_on_correction() {
        let gate = AddressUpdateGate::new();
        let corrector = gate.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            corrector.signal("500 Oak Ave");
        });

        let started = tokio::time::Instant::now();
        let result = gate.wait_for_update(Duration::from_secs(60)).await;

        assert_eq!(result, Some("500 Oak Ave".to_string()));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sees_correction_delivered_before_it_began() {
        let gate = AddressUpdateGate::new();
        gate.signal("42 Pine Rd");

        let result = gate.wait_for_update(Duration::from_secs(60)).await;
        assert_eq!(result, Some("42 Pine Rd".to_string()));
    }
}
