//! Simulated order operations with configurable failure injection.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{OrderInput, OrderItem, Variant};

use crate::activities::OrderActivities;
use crate::invoker::StepFailure;
use crate::order_fulfillment;

/// Latency of one simulated external call.
const SIMULATED_LATENCY: Duration = Duration::from_millis(1000);

/// Payment attempts that fail before the API-failure variant recovers.
const API_FAILURE_ATTEMPTS: u32 = 4;

#[derive(Debug, Default)]
struct SimulatedState {
    call_log: Vec<&'static str>,
    charge_attempts: u32,
    prepared: u32,
    charged: u32,
    shipped_items: Vec<i64>,
    fail_on_prepare: bool,
    fail_on_charge: bool,
    fail_on_undo_prepare: bool,
    fail_on_undo_charge: bool,
    fail_ship_for_item: Option<i64>,
}

/// In-memory stand-in for the external order services.
///
/// Tracks live side effects (booked shipments, captured payments, shipped
/// items) so tests can assert that compensations actually reversed them,
/// and keeps an ordered call log for reversal-order assertions. Clones
/// share state.
#[derive(Debug, Clone)]
pub struct SimulatedOrderActivities {
    state: Arc<RwLock<SimulatedState>>,
    latency: Duration,
}

impl SimulatedOrderActivities {
    /// Creates simulated services with the default per-call latency.
    pub fn new() -> Self {
        Self::with_latency(SIMULATED_LATENCY)
    }

    /// Creates simulated services with a custom per-call latency.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(SimulatedState::default())),
            latency,
        }
    }

    /// Configures the carrier booking to fail.
    pub fn set_fail_on_prepare(&self, fail: bool) {
        self.state.write().unwrap().fail_on_prepare = fail;
    }

    /// Configures payment capture to fail with a business error.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().unwrap().fail_on_charge = fail;
    }

    /// Configures the booked-shipment release to fail.
    pub fn set_fail_on_undo_prepare(&self, fail: bool) {
        self.state.write().unwrap().fail_on_undo_prepare = fail;
    }

    /// Configures the payment refund to fail.
    pub fn set_fail_on_undo_charge(&self, fail: bool) {
        self.state.write().unwrap().fail_on_undo_charge = fail;
    }

    /// Configures shipment of the given item to fail.
    pub fn set_fail_on_ship_item(&self, item_id: i64) {
        self.state.write().unwrap().fail_ship_for_item = Some(item_id);
    }

    /// Returns the operations invoked so far, in call order.
    pub fn call_log(&self) -> Vec<&'static str> {
        self.state.read().unwrap().call_log.clone()
    }

    /// Returns how many payment captures have been attempted.
    pub fn charge_attempts(&self) -> u32 {
        self.state.read().unwrap().charge_attempts
    }

    /// Returns the number of booked shipments not yet released.
    pub fn prepared_count(&self) -> u32 {
        self.state.read().unwrap().prepared
    }

    /// Returns the number of captured payments not yet refunded.
    pub fn charge_count(&self) -> u32 {
        self.state.read().unwrap().charged
    }

    /// Returns the ids of items shipped so far, in completion order.
    pub fn shipped_items(&self) -> Vec<i64> {
        self.state.read().unwrap().shipped_items.clone()
    }

    async fn simulate_external_operation(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for SimulatedOrderActivities {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderActivities for SimulatedOrderActivities {
    async fn get_items(&self) -> Result<Vec<OrderItem>, StepFailure> {
        self.simulate_external_operation().await;
        self.state
            .write()
            .unwrap()
            .call_log
            .push(order_fulfillment::STEP_GET_ITEMS);

        let mut items = vec![
            OrderItem::new(654321, "Table Legs", 2),
            OrderItem::new(654300, "Table Top", 1),
            OrderItem::new(654322, "Keypad", 1),
        ];
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    async fn check_fraud(&self, _input: &OrderInput) -> Result<(), StepFailure> {
        self.simulate_external_operation().await;
        self.state
            .write()
            .unwrap()
            .call_log
            .push(order_fulfillment::STEP_CHECK_FRAUD);
        Ok(())
    }

    async fn prepare_shipment(&self, _input: &OrderInput) -> Result<(), StepFailure> {
        self.simulate_external_operation().await;
        let mut state = self.state.write().unwrap();
        state.call_log.push(order_fulfillment::STEP_PREPARE_SHIPMENT);

        if state.fail_on_prepare {
            return Err(StepFailure::non_retryable("carrier rejected the booking"));
        }
        state.prepared += 1;
        Ok(())
    }

    async fn undo_prepare_shipment(&self, _input: &OrderInput) -> Result<(), StepFailure> {
        self.simulate_external_operation().await;
        let mut state = self.state.write().unwrap();
        state
            .call_log
            .push(order_fulfillment::STEP_UNDO_PREPARE_SHIPMENT);

        if state.fail_on_undo_prepare {
            return Err(StepFailure::non_retryable("carrier release failed"));
        }
        state.prepared = state.prepared.saturating_sub(1);
        Ok(())
    }

    async fn charge_customer(
        &self,
        _input: &OrderInput,
        variant: Variant,
    ) -> Result<(), StepFailure> {
        self.simulate_external_operation().await;
        let mut state = self.state.write().unwrap();
        state.call_log.push(order_fulfillment::STEP_CHARGE_CUSTOMER);
        state.charge_attempts += 1;
        let attempt = state.charge_attempts;

        match variant {
            Variant::ApiFailure if attempt <= API_FAILURE_ATTEMPTS => Err(StepFailure::retryable(
                "payment capture failed, API unavailable",
            )),
            Variant::NonRecoverableFailure => {
                Err(StepFailure::non_retryable("credit card invalid"))
            }
            _ if state.fail_on_charge => Err(StepFailure::non_retryable("payment declined")),
            _ => {
                state.charged += 1;
                Ok(())
            }
        }
    }

    async fn undo_charge_customer(&self, _input: &OrderInput) -> Result<(), StepFailure> {
        self.simulate_external_operation().await;
        let mut state = self.state.write().unwrap();
        state
            .call_log
            .push(order_fulfillment::STEP_UNDO_CHARGE_CUSTOMER);

        if state.fail_on_undo_charge {
            return Err(StepFailure::non_retryable("refund failed"));
        }
        state.charged = state.charged.saturating_sub(1);
        Ok(())
    }

    async fn ship_item(&self, _input: &OrderInput, item: &OrderItem) -> Result<(), StepFailure> {
        self.simulate_external_operation().await;
        let mut state = self.state.write().unwrap();
        state.call_log.push(order_fulfillment::STEP_SHIP_ORDER);

        if state.fail_ship_for_item == Some(item.id) {
            return Err(StepFailure::non_retryable(format!(
                "carrier rejected item {}",
                item.id
            )));
        }
        state.shipped_items.push(item.id);
        Ok(())
    }
}
