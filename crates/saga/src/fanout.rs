//! Concurrent per-item shipment dispatch.

use std::sync::Arc;

use domain::{OrderInput, OrderItem, Variant};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};

use crate::activities::OrderActivities;
use crate::controller::SagaConfig;
use crate::error::{Result, SagaError};
use crate::invoker::StepInvoker;
use crate::order_fulfillment;
use crate::shipping::ShippingSaga;

/// Ships every item concurrently and joins all results.
///
/// One dispatch per item: under the child-workflow variant each item gets
/// its own [`ShippingSaga`]; otherwise the ship operation is invoked
/// directly. Every dispatch is awaited to completion before this returns,
/// so a failing item never abandons its in-flight siblings; the first
/// failure (in item order) decides the aggregate result.
pub async fn ship_all<A>(
    invoker: &StepInvoker,
    activities: &Arc<A>,
    config: &SagaConfig,
    input: &OrderInput,
    items: &[OrderItem],
    variant: Variant,
) -> Result<()>
where
    A: OrderActivities + 'static,
{
    let dispatches: Vec<BoxFuture<'_, Result<()>>> = items
        .iter()
        .map(|item| {
            tracing::info!(item_id = item.id, item = %item.description, "shipping item");
            if variant.ships_via_child_saga() {
                let child = ShippingSaga::start(
                    Arc::clone(activities),
                    config.step_options(),
                    input.clone(),
                    item.clone(),
                );
                async move { child.join().await }.boxed()
            } else {
                invoker
                    .invoke(order_fulfillment::STEP_SHIP_ORDER, || {
                        activities.ship_item(input, item)
                    })
                    .boxed()
            }
        })
        .collect();

    let outcomes = join_all(dispatches).await;

    let mut first_failure = None;
    for (item, outcome) in items.iter().zip(outcomes) {
        if let Err(err) = outcome {
            tracing::warn!(item_id = item.id, error = %err, "item shipment failed");
            if first_failure.is_none() {
                first_failure = Some(SagaError::Shipment {
                    item_id: item.id,
                    source: Box::new(err),
                });
            }
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
