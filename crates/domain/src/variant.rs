//! Saga behavior variants.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Selects which behavioral branch a fulfillment saga executes.
///
/// The variant is chosen when the saga is created and is fixed for its
/// lifetime; the saga switches on it once at each decision point rather
/// than comparing workflow-type strings throughout the control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Straight-through fulfillment with no injected behavior.
    #[default]
    HappyPath,

    /// Injects a deliberate defect before shipping to exercise rollback.
    RecoverableFailure,

    /// Delegates each item shipment to an independent child saga.
    ChildWorkflow,

    /// Waits for a fire-and-forget address correction before shipping.
    HumanInLoopSignal,

    /// Waits for a validated address correction before shipping.
    HumanInLoopUpdate,

    /// Publishes each status transition to the visibility index.
    AdvancedVisibility,

    /// Payment capture fails transiently until retries succeed.
    #[serde(rename = "APIFailure")]
    ApiFailure,

    /// Payment capture fails with a non-retryable business error.
    NonRecoverableFailure,
}

impl Variant {
    /// Returns true if the saga should fail with an injected defect
    /// before shipping.
    pub fn injects_fault(&self) -> bool {
        matches!(self, Variant::RecoverableFailure)
    }

    /// Returns true if the saga waits for a human address correction
    /// before shipping.
    pub fn awaits_address(&self) -> bool {
        matches!(
            self,
            Variant::HumanInLoopSignal | Variant::HumanInLoopUpdate
        )
    }

    /// Returns true if each item ships through its own child saga.
    pub fn ships_via_child_saga(&self) -> bool {
        matches!(self, Variant::ChildWorkflow)
    }

    /// Returns true if status transitions are published to the
    /// visibility index.
    pub fn indexes_status(&self) -> bool {
        matches!(self, Variant::AdvancedVisibility)
    }

    /// Returns the variant name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::HappyPath => "HappyPath",
            Variant::RecoverableFailure => "RecoverableFailure",
            Variant::ChildWorkflow => "ChildWorkflow",
            Variant::HumanInLoopSignal => "HumanInLoopSignal",
            Variant::HumanInLoopUpdate => "HumanInLoopUpdate",
            Variant::AdvancedVisibility => "AdvancedVisibility",
            Variant::ApiFailure => "APIFailure",
            Variant::NonRecoverableFailure => "NonRecoverableFailure",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unrecognized variant name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown saga variant: {0}")]
pub struct UnknownVariant(pub String);

impl FromStr for Variant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HappyPath" => Ok(Variant::HappyPath),
            "RecoverableFailure" => Ok(Variant::RecoverableFailure),
            "ChildWorkflow" => Ok(Variant::ChildWorkflow),
            "HumanInLoopSignal" => Ok(Variant::HumanInLoopSignal),
            "HumanInLoopUpdate" => Ok(Variant::HumanInLoopUpdate),
            "AdvancedVisibility" => Ok(Variant::AdvancedVisibility),
            "APIFailure" => Ok(Variant::ApiFailure),
            "NonRecoverableFailure" => Ok(Variant::NonRecoverableFailure),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Variant; 8] = [
        Variant::HappyPath,
        Variant::RecoverableFailure,
        Variant::ChildWorkflow,
        Variant::HumanInLoopSignal,
        Variant::HumanInLoopUpdate,
        Variant::AdvancedVisibility,
        Variant::ApiFailure,
        Variant::NonRecoverableFailure,
    ];

    #[test]
    fn test_default_is_happy_path() {
        assert_eq!(Variant::default(), Variant::HappyPath);
    }

    #[test]
    fn test_display_parse_roundtrip() {
        for variant in ALL {
            let parsed: Variant = variant.as_str().parse().unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let err = "NoSuchVariant".parse::<Variant>().unwrap_err();
        assert_eq!(err, UnknownVariant("NoSuchVariant".to_string()));
    }

    #[test]
    fn test_behavior_flags() {
        assert!(Variant::RecoverableFailure.injects_fault());
        assert!(Variant::HumanInLoopSignal.awaits_address());
        assert!(Variant::HumanInLoopUpdate.awaits_address());
        assert!(Variant::ChildWorkflow.ships_via_child_saga());
        assert!(Variant::AdvancedVisibility.indexes_status());

        assert!(!Variant::HappyPath.injects_fault());
        assert!(!Variant::HappyPath.awaits_address());
        assert!(!Variant::HappyPath.ships_via_child_saga());
        assert!(!Variant::HappyPath.indexes_status());
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&Variant::ApiFailure).unwrap();
        assert_eq!(json, "\"APIFailure\"");
        let parsed: Variant = serde_json::from_str("\"ChildWorkflow\"").unwrap();
        assert_eq!(parsed, Variant::ChildWorkflow);
    }
}
