//! Child saga that ships a single order item.

use std::sync::Arc;

use domain::{OrderInput, OrderItem};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::activities::OrderActivities;
use crate::error::{Result, SagaError};
use crate::invoker::{StepInvoker, StepOptions};
use crate::order_fulfillment;

/// An independently identified sub-saga that ships one item on its own
/// task with its own step invoker.
///
/// The handle carries the parent-close termination policy: dropping it
/// aborts the child, so a parent that terminates (or is cancelled) never
/// leaks shipment work.
#[derive(Debug)]
pub struct ShippingSaga {
    id: String,
    handle: JoinHandle<Result<()>>,
}

impl ShippingSaga {
    /// Returns the instance id for an item shipment:
    /// `shipment-{orderId}-{itemId}`.
    pub fn instance_id(input: &OrderInput, item: &OrderItem) -> String {
        format!("shipment-{}-{}", input.order_id, item.id)
    }

    /// Starts the child saga.
    pub fn start<A>(
        activities: Arc<A>,
        options: StepOptions,
        input: OrderInput,
        item: OrderItem,
    ) -> Self
    where
        A: OrderActivities + 'static,
    {
        let id = Self::instance_id(&input, &item);
        tracing::info!(saga_id = %id, "starting child shipping saga");

        let span = tracing::info_span!("shipping_saga", saga_id = %id);
        let handle = tokio::spawn(
            async move {
                let invoker = StepInvoker::new(options);
                invoker
                    .invoke(order_fulfillment::STEP_SHIP_ORDER, || {
                        activities.ship_item(&input, &item)
                    })
                    .await
            }
            .instrument(span),
        );

        Self { id, handle }
    }

    /// Returns the child saga's instance id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Awaits the child to completion.
    pub async fn join(mut self) -> Result<()> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(err) => Err(SagaError::ChildTerminated {
                id: self.id.clone(),
                reason: err.to_string(),
            }),
        }
    }
}

impl Drop for ShippingSaga {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
