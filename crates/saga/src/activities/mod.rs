//! External operations invoked by saga steps.
//!
//! Each operation is an opaque remote call (inventory lookup, fraud
//! scoring, payment gateway, shipping carrier). The saga only sees the
//! trait; the simulated implementation stands in for the real services.

pub mod simulated;

pub use simulated::SimulatedOrderActivities;

use async_trait::async_trait;
use domain::{OrderInput, OrderItem, Variant};

use crate::invoker::StepFailure;

/// The external operations behind each saga step.
#[async_trait]
pub trait OrderActivities: Send + Sync {
    /// Fetches the item list for the order.
    async fn get_items(&self) -> Result<Vec<OrderItem>, StepFailure>;

    /// Scores the order for fraud.
    async fn check_fraud(&self, input: &OrderInput) -> Result<(), StepFailure>;

    /// Books the shipment with the carrier.
    async fn prepare_shipment(&self, input: &OrderInput) -> Result<(), StepFailure>;

    /// Releases a previously booked shipment.
    async fn undo_prepare_shipment(&self, input: &OrderInput) -> Result<(), StepFailure>;

    /// Captures payment for the order. The variant tag only selects
    /// simulated failure behavior; production implementations ignore it.
    async fn charge_customer(
        &self,
        input: &OrderInput,
        variant: Variant,
    ) -> Result<(), StepFailure>;

    /// Refunds a previously captured payment.
    async fn undo_charge_customer(&self, input: &OrderInput) -> Result<(), StepFailure>;

    /// Ships a single order item.
    async fn ship_item(&self, input: &OrderInput, item: &OrderItem) -> Result<(), StepFailure>;
}
