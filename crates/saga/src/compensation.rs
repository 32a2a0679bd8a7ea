//! Ordered record of reversal actions registered as forward steps succeed.

use domain::OrderInput;

use crate::activities::OrderActivities;
use crate::error::Result;
use crate::invoker::StepInvoker;
use crate::order_fulfillment;

/// A reversal action for a forward step.
///
/// The set is closed so a registered compensation is inspectable and can
/// be replayed: each entry carries the order snapshot it reverses.
#[derive(Debug, Clone)]
pub enum Compensation {
    /// Releases a booked shipment.
    UndoPrepareShipment(OrderInput),
    /// Refunds a captured payment.
    UndoChargeCustomer(OrderInput),
}

impl Compensation {
    /// Returns the name of the reversal operation.
    pub fn label(&self) -> &'static str {
        match self {
            Compensation::UndoPrepareShipment(_) => order_fulfillment::STEP_UNDO_PREPARE_SHIPMENT,
            Compensation::UndoChargeCustomer(_) => order_fulfillment::STEP_UNDO_CHARGE_CUSTOMER,
        }
    }

    async fn reverse<A>(&self, invoker: &StepInvoker, activities: &A) -> Result<()>
    where
        A: OrderActivities + ?Sized,
    {
        match self {
            Compensation::UndoPrepareShipment(input) => {
                invoker
                    .invoke(order_fulfillment::STEP_UNDO_PREPARE_SHIPMENT, || {
                        activities.undo_prepare_shipment(input)
                    })
                    .await
            }
            Compensation::UndoChargeCustomer(input) => {
                invoker
                    .invoke(order_fulfillment::STEP_UNDO_CHARGE_CUSTOMER, || {
                        activities.undo_charge_customer(input)
                    })
                    .await
            }
        }
    }
}

/// The result of one attempted reversal.
#[derive(Debug)]
pub struct CompensationOutcome {
    /// The reversal operation that ran.
    pub label: &'static str,
    /// Whether it succeeded, and how it failed if not.
    pub result: Result<()>,
}

impl CompensationOutcome {
    /// Returns true if the reversal succeeded.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// LIFO stack of compensations for one saga attempt.
///
/// Entries are pushed immediately before the forward step they reverse,
/// so a step that half-completes is still compensated. Unwinding attempts
/// every entry exactly once, most recent first; a reversal that fails is
/// recorded and does not stop the unwind.
#[derive(Debug, Default)]
pub struct CompensationStack {
    entries: Vec<Compensation>,
}

impl CompensationStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a reversal for the forward step about to run.
    pub fn push(&mut self, entry: Compensation) {
        self.entries.push(entry);
    }

    /// Returns the number of registered reversals.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no reversals are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the registered reversal names, oldest first.
    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(Compensation::label).collect()
    }

    /// Runs every registered reversal in reverse registration order,
    /// draining the stack. Never fails; per-entry outcomes are returned
    /// for logging.
    pub async fn unwind_all<A>(
        &mut self,
        invoker: &StepInvoker,
        activities: &A,
    ) -> Vec<CompensationOutcome>
    where
        A: OrderActivities + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(self.entries.len());
        while let Some(entry) = self.entries.pop() {
            let label = entry.label();
            tracing::info!(compensation = label, "running compensation");
            let result = entry.reverse(invoker, activities).await;
            if let Err(err) = &result {
                tracing::warn!(compensation = label, error = %err, "compensation failed");
            }
            outcomes.push(CompensationOutcome { label, result });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::SimulatedOrderActivities;
    use std::time::Duration;

    fn input() -> OrderInput {
        OrderInput::new("ORD-1", "123 A St")
    }

    fn setup() -> (StepInvoker, SimulatedOrderActivities) {
        (
            StepInvoker::default(),
            SimulatedOrderActivities::with_latency(Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn test_unwind_runs_in_reverse_registration_order() {
        let (invoker, activities) = setup();
        let mut stack = CompensationStack::new();
        stack.push(Compensation::UndoPrepareShipment(input()));
        stack.push(Compensation::UndoChargeCustomer(input()));
        assert_eq!(
            stack.labels(),
            vec!["undo_prepare_shipment", "undo_charge_customer"]
        );

        let outcomes = stack.unwind_all(&invoker, &activities).await;

        let labels: Vec<_> = outcomes.iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["undo_charge_customer", "undo_prepare_shipment"]);
        assert!(outcomes.iter().all(CompensationOutcome::succeeded));
        assert!(stack.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reversal_does_not_stop_the_unwind() {
        let (invoker, activities) = setup();
        activities.set_fail_on_undo_charge(true);

        let mut stack = CompensationStack::new();
        stack.push(Compensation::UndoPrepareShipment(input()));
        stack.push(Compensation::UndoChargeCustomer(input()));

        let outcomes = stack.unwind_all(&invoker, &activities).await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].succeeded());
        assert!(outcomes[1].succeeded());
        assert_eq!(
            activities.call_log(),
            vec!["undo_charge_customer", "undo_prepare_shipment"]
        );
    }

    #[tokio::test]
    async fn test_unwind_of_empty_stack_is_a_no_op() {
        let (invoker, activities) = setup();
        let mut stack = CompensationStack::new();

        let outcomes = stack.unwind_all(&invoker, &activities).await;

        assert!(outcomes.is_empty());
        assert!(activities.call_log().is_empty());
    }
}
