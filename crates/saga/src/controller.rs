//! Order saga controller.

use std::sync::Arc;
use std::time::Duration;

use domain::{OrderInput, OrderOutput, Variant};
use uuid::Uuid;

use crate::activities::OrderActivities;
use crate::compensation::{Compensation, CompensationStack};
use crate::error::{Result, SagaError};
use crate::fanout;
use crate::gate::AddressUpdateGate;
use crate::invoker::{RetryPolicy, StepInvoker, StepOptions};
use crate::messages::SagaHandle;
use crate::order_fulfillment::{
    STATUS_CHARGE_CUSTOMER, STATUS_CHECK_FRAUD, STATUS_ORDER_COMPLETED, STATUS_PREPARE_SHIPMENT,
    STATUS_SHIP_ORDER, STEP_CHARGE_CUSTOMER, STEP_CHECK_FRAUD, STEP_GET_ITEMS,
    STEP_PREPARE_SHIPMENT,
};
use crate::progress::ProgressTracker;
use crate::visibility::VisibilityIndex;

/// Tunable knobs for one saga instance.
#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// Per-attempt timeout for every step invocation.
    pub step_timeout: Duration,
    /// Retry policy for every step invocation.
    pub retry: RetryPolicy,
    /// How long to wait for a human address correction.
    pub address_wait: Duration,
    /// Settle delay before the prepare-shipment step.
    pub prepare_settle: Duration,
    /// Settle delay before the charge-customer step.
    pub charge_settle: Duration,
    /// Settle delay before the ship-order step.
    pub ship_settle: Duration,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            address_wait: Duration::from_secs(60),
            prepare_settle: Duration::from_secs(1),
            charge_settle: Duration::from_secs(1),
            ship_settle: Duration::from_secs(3),
        }
    }
}

impl SagaConfig {
    /// Returns the step options every invocation runs under.
    pub fn step_options(&self) -> StepOptions {
        StepOptions {
            timeout: self.step_timeout,
            retry: self.retry.clone(),
        }
    }
}

/// Orchestrates one order fulfillment saga from start to completion or
/// failure.
///
/// The controller owns the saga-scoped state for a single run: it is the
/// only writer of progress/status, and the only consumer of the address
/// gate. External callers observe and steer the run through the
/// [`SagaHandle`] returned by [`OrderSaga::handle`].
pub struct OrderSaga<A, V>
where
    A: OrderActivities,
    V: VisibilityIndex,
{
    activities: Arc<A>,
    visibility: Arc<V>,
    config: SagaConfig,
    tracker: ProgressTracker,
    gate: AddressUpdateGate,
}

impl<A, V> OrderSaga<A, V>
where
    A: OrderActivities + 'static,
    V: VisibilityIndex,
{
    /// Creates a saga with the default configuration.
    pub fn new(activities: Arc<A>, visibility: Arc<V>) -> Self {
        Self::with_config(activities, visibility, SagaConfig::default())
    }

    /// Creates a saga with a custom configuration.
    pub fn with_config(activities: Arc<A>, visibility: Arc<V>, config: SagaConfig) -> Self {
        Self {
            activities,
            visibility,
            config,
            tracker: ProgressTracker::new(),
            gate: AddressUpdateGate::new(),
        }
    }

    /// Returns the query/signal/update channels for this saga.
    pub fn handle(&self) -> SagaHandle {
        SagaHandle::new(self.tracker.clone(), self.gate.clone())
    }

    /// Runs the saga to completion or failure.
    #[tracing::instrument(
        skip(self, input),
        fields(saga_type = crate::order_fulfillment::SAGA_TYPE, order_id = %input.order_id, variant = %variant)
    )]
    pub async fn run(&self, input: OrderInput, variant: Variant) -> Result<OrderOutput> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();
        tracing::info!("order fulfillment saga started");

        let result = self.execute(input, variant).await;

        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        match &result {
            Ok(output) => {
                metrics::counter!("saga_completed").increment(1);
                tracing::info!(tracking_id = %output.tracking_id, "saga completed successfully");
            }
            Err(err) => {
                metrics::counter!("saga_failed").increment(1);
                tracing::warn!(error = %err, "saga failed");
            }
        }
        result
    }

    async fn execute(&self, mut input: OrderInput, variant: Variant) -> Result<OrderOutput> {
        let invoker = StepInvoker::new(self.config.step_options());
        let mut compensations = CompensationStack::new();

        // Nothing to compensate yet: a failure here is fatal.
        let items = invoker
            .invoke(STEP_GET_ITEMS, || self.activities.get_items())
            .await?;

        self.transition(&input, variant, STATUS_CHECK_FRAUD, 0, Duration::ZERO)
            .await;
        invoker
            .invoke(STEP_CHECK_FRAUD, || self.activities.check_fraud(&input))
            .await?;

        self.transition(
            &input,
            variant,
            STATUS_PREPARE_SHIPMENT,
            25,
            self.config.prepare_settle,
        )
        .await;
        // Registered before the call so a half-completed booking is still
        // released on rollback.
        compensations.push(Compensation::UndoPrepareShipment(input.clone()));
        invoker
            .invoke(STEP_PREPARE_SHIPMENT, || {
                self.activities.prepare_shipment(&input)
            })
            .await?;

        self.transition(
            &input,
            variant,
            STATUS_CHARGE_CUSTOMER,
            50,
            self.config.charge_settle,
        )
        .await;
        compensations.push(Compensation::UndoChargeCustomer(input.clone()));
        if let Err(err) = invoker
            .invoke(STEP_CHARGE_CUSTOMER, || {
                self.activities.charge_customer(&input, variant)
            })
            .await
        {
            return Err(self.roll_back(&invoker, &mut compensations, err).await);
        }

        self.transition(
            &input,
            variant,
            STATUS_SHIP_ORDER,
            75,
            self.config.ship_settle,
        )
        .await;

        if variant.injects_fault() {
            return Err(self
                .roll_back(&invoker, &mut compensations, SagaError::InjectedFault)
                .await);
        }

        if variant.awaits_address() {
            tracing::info!(wait = ?self.config.address_wait, "waiting for an updated address");
            match self.gate.wait_for_update(self.config.address_wait).await {
                Some(address) => {
                    tracing::info!(%address, "applying corrected address");
                    input.address = address;
                }
                None => {
                    tracing::info!("no correction received, keeping the original address");
                }
            }
        }

        if let Err(err) = fanout::ship_all(
            &invoker,
            &self.activities,
            &self.config,
            &input,
            &items,
            variant,
        )
        .await
        {
            return Err(self.roll_back(&invoker, &mut compensations, err).await);
        }

        self.transition(&input, variant, STATUS_ORDER_COMPLETED, 100, Duration::ZERO)
            .await;

        Ok(OrderOutput {
            tracking_id: Uuid::new_v4().to_string(),
            address: input.address,
        })
    }

    /// Enters the next step: settles, commits progress/status, and under
    /// the advanced-visibility variant publishes the status for search.
    async fn transition(
        &self,
        input: &OrderInput,
        variant: Variant,
        status: &str,
        progress: u8,
        settle: Duration,
    ) {
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        self.tracker.advance(status, progress);
        tracing::info!(status, progress, "entering step");

        if variant.indexes_status() {
            if let Err(err) = self
                .visibility
                .upsert_order_status(&input.order_id, status)
                .await
            {
                tracing::warn!(error = %err, "failed to publish status to visibility index");
            }
        }
    }

    /// Unwinds all registered compensations and returns the original
    /// failure unchanged. Reversal failures are logged, never raised.
    async fn roll_back(
        &self,
        invoker: &StepInvoker,
        compensations: &mut CompensationStack,
        cause: SagaError,
    ) -> SagaError {
        metrics::counter!("saga_compensations_total").increment(1);
        tracing::warn!(
            error = %cause,
            registered = compensations.len(),
            "unwinding compensations"
        );

        let outcomes = compensations
            .unwind_all(invoker, self.activities.as_ref())
            .await;
        let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
        if failed > 0 {
            tracing::warn!(failed, total = outcomes.len(), "some compensations failed");
        }

        cause
    }
}
