//! Order fulfillment saga.
//!
//! This crate coordinates a multi-step order fulfillment transaction as a
//! saga: forward steps plus compensating reversals instead of an atomic
//! commit. The sequence is:
//!
//! 1. Fetch items
//! 2. Check fraud
//! 3. Prepare shipment
//! 4. Charge customer
//! 5. Optionally wait for a human address correction
//! 6. Ship every item concurrently (optionally via child sagas)
//!
//! Compensations are registered before the forward step they reverse, so a
//! step that half-completes is still compensated. A failure at or after
//! payment capture unwinds the registered compensations in reverse order and
//! re-raises the original error.
//!
//! While a saga runs it can be observed and steered through a [`SagaHandle`]:
//! a synchronous progress query, a fire-and-forget address-correction signal,
//! and a validated synchronous address update.

pub mod activities;
pub mod compensation;
pub mod controller;
pub mod error;
pub mod fanout;
pub mod gate;
pub mod invoker;
pub mod messages;
pub mod order_fulfillment;
pub mod progress;
pub mod shipping;
pub mod visibility;

pub use activities::{OrderActivities, SimulatedOrderActivities};
pub use compensation::{Compensation, CompensationOutcome, CompensationStack};
pub use controller::{OrderSaga, SagaConfig};
pub use error::{Result, SagaError};
pub use gate::{AddressUpdateGate, UpdateRejected};
pub use invoker::{FailureKind, RetryPolicy, StepFailure, StepInvoker, StepOptions};
pub use messages::SagaHandle;
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use shipping::ShippingSaga;
pub use visibility::{InMemoryVisibilityIndex, VisibilityIndex};
