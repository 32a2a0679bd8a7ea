//! Integration tests for the order fulfillment saga.

use std::sync::Arc;
use std::time::Duration;

use common::OrderId;
use domain::{OrderInput, Variant};
use saga::{
    FailureKind, InMemoryVisibilityIndex, OrderSaga, SagaError, SimulatedOrderActivities,
};

struct TestHarness {
    activities: Arc<SimulatedOrderActivities>,
    visibility: Arc<InMemoryVisibilityIndex>,
    saga: Arc<OrderSaga<SimulatedOrderActivities, InMemoryVisibilityIndex>>,
}

impl TestHarness {
    fn new() -> Self {
        let activities = Arc::new(SimulatedOrderActivities::new());
        let visibility = Arc::new(InMemoryVisibilityIndex::new());
        let saga = Arc::new(OrderSaga::new(
            Arc::clone(&activities),
            Arc::clone(&visibility),
        ));
        Self {
            activities,
            visibility,
            saga,
        }
    }

    fn input() -> OrderInput {
        OrderInput::new("ORD-1", "123 A St")
    }

    fn shipped_sorted(&self) -> Vec<i64> {
        let mut shipped = self.activities.shipped_items();
        shipped.sort_unstable();
        shipped
    }
}

#[tokio::test(start_paused = true)]
async fn test_happy_path_round_trip() {
    let h = TestHarness::new();
    let handle = h.saga.handle();

    let output = h.saga.run(TestHarness::input(), Variant::HappyPath).await.unwrap();

    // Tracking id is uuid-shaped, address is the original.
    uuid::Uuid::parse_str(&output.tracking_id).unwrap();
    assert_eq!(output.address, "123 A St");

    let snapshot = handle.query();
    assert_eq!(snapshot.progress, 100);
    assert_eq!(snapshot.status, "Order Completed");

    assert_eq!(h.shipped_sorted(), vec![654300, 654321, 654322]);
    assert_eq!(h.activities.prepared_count(), 1);
    assert_eq!(h.activities.charge_count(), 1);

    // No compensation on the happy path.
    let log = h.activities.call_log();
    assert!(!log.contains(&"undo_prepare_shipment"));
    assert!(!log.contains(&"undo_charge_customer"));
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic_and_ends_at_100() {
    let h = TestHarness::new();
    let handle = h.saga.handle();

    let saga = Arc::clone(&h.saga);
    let run = tokio::spawn(async move { saga.run(TestHarness::input(), Variant::HappyPath).await });

    let mut samples = vec![handle.progress()];
    while !run.is_finished() {
        tokio::time::sleep(Duration::from_millis(250)).await;
        samples.push(handle.progress());
    }
    samples.push(handle.progress());

    run.await.unwrap().unwrap();
    assert!(samples.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(*samples.last().unwrap(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_charge_failure_compensates_in_reverse_order() {
    let h = TestHarness::new();

    let err = h
        .saga
        .run(TestHarness::input(), Variant::NonRecoverableFailure)
        .await
        .unwrap_err();

    // The original failure surfaces unchanged, classification intact.
    match &err {
        SagaError::Step { step, attempts, .. } => {
            assert_eq!(*step, "charge_customer");
            assert_eq!(*attempts, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.failure_kind(), Some(FailureKind::NonRetryable));

    // A business failure is never retried.
    assert_eq!(h.activities.charge_attempts(), 1);

    // Exactly the registered reversals ran, most recent first, once each.
    let log = h.activities.call_log();
    assert_eq!(
        log,
        vec![
            "get_items",
            "check_fraud",
            "prepare_shipment",
            "charge_customer",
            "undo_charge_customer",
            "undo_prepare_shipment",
        ]
    );
    assert_eq!(h.activities.prepared_count(), 0);
    assert!(h.activities.shipped_items().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_reversal_never_masks_the_original_failure() {
    let h = TestHarness::new();
    h.activities.set_fail_on_undo_charge(true);

    let err = h
        .saga
        .run(TestHarness::input(), Variant::NonRecoverableFailure)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SagaError::Step {
            step: "charge_customer",
            ..
        }
    ));

    // The failed refund did not stop the release of the booking.
    let log = h.activities.call_log();
    assert!(log.contains(&"undo_charge_customer"));
    assert!(log.contains(&"undo_prepare_shipment"));
    assert_eq!(h.activities.prepared_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_api_failure_recovers_after_retries() {
    let h = TestHarness::new();

    let output = h
        .saga
        .run(TestHarness::input(), Variant::ApiFailure)
        .await
        .unwrap();

    assert_eq!(output.address, "123 A St");
    assert_eq!(h.activities.charge_attempts(), 5);
    assert_eq!(h.shipped_sorted(), vec![654300, 654321, 654322]);

    let log = h.activities.call_log();
    assert!(!log.contains(&"undo_charge_customer"));
}

#[tokio::test(start_paused = true)]
async fn test_injected_fault_rolls_back_before_shipping() {
    let h = TestHarness::new();

    let err = h
        .saga
        .run(TestHarness::input(), Variant::RecoverableFailure)
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::InjectedFault));
    assert!(h.activities.shipped_items().is_empty());

    let log = h.activities.call_log();
    assert!(log.contains(&"undo_charge_customer"));
    assert!(log.contains(&"undo_prepare_shipment"));
    assert_eq!(h.activities.prepared_count(), 0);
    assert_eq!(h.activities.charge_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_prepare_failure_propagates_without_compensation() {
    let h = TestHarness::new();
    h.activities.set_fail_on_prepare(true);

    let err = h
        .saga
        .run(TestHarness::input(), Variant::HappyPath)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SagaError::Step {
            step: "prepare_shipment",
            ..
        }
    ));

    let log = h.activities.call_log();
    assert!(!log.contains(&"undo_prepare_shipment"));
    assert!(!log.contains(&"undo_charge_customer"));
}

#[tokio::test(start_paused = true)]
async fn test_signal_corrects_the_address() {
    let h = TestHarness::new();
    let handle = h.saga.handle();

    let saga = Arc::clone(&h.saga);
    let run =
        tokio::spawn(async move { saga.run(TestHarness::input(), Variant::HumanInLoopSignal).await });

    tokio::time::sleep(Duration::from_secs(10)).await;
    handle.signal_update_order("500 Oak Ave");

    let output = run.await.unwrap().unwrap();
    assert_eq!(output.address, "500 Oak Ave");
}

#[tokio::test(start_paused = true)]
async fn test_update_corrects_the_address_and_confirms() {
    let h = TestHarness::new();
    let handle = h.saga.handle();

    let saga = Arc::clone(&h.saga);
    let run =
        tokio::spawn(async move { saga.run(TestHarness::input(), Variant::HumanInLoopUpdate).await });

    tokio::time::sleep(Duration::from_secs(10)).await;
    let ack = handle.update_order("5 Main St").unwrap();
    assert_eq!(ack, "Updated address: 5 Main St");

    let output = run.await.unwrap().unwrap();
    assert_eq!(output.address, "5 Main St");
}

#[tokio::test(start_paused = true)]
async fn test_rejected_update_changes_nothing() {
    let h = TestHarness::new();
    let handle = h.saga.handle();

    let saga = Arc::clone(&h.saga);
    let run =
        tokio::spawn(async move { saga.run(TestHarness::input(), Variant::HumanInLoopUpdate).await });

    // Let the saga reach the address wait.
    while handle.progress() < 75 {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    let before = handle.query();
    assert!(handle.update_order("Main St").is_err());
    assert_eq!(handle.query(), before);

    // The wait times out and the order proceeds with the original address.
    let output = run.await.unwrap().unwrap();
    assert_eq!(output.address, "123 A St");
}

#[tokio::test(start_paused = true)]
async fn test_update_timeout_keeps_original_address_after_60s() {
    let h = TestHarness::new();
    let started = tokio::time::Instant::now();

    let output = h
        .saga
        .run(TestHarness::input(), Variant::HumanInLoopUpdate)
        .await
        .unwrap();

    assert_eq!(output.address, "123 A St");
    assert!(started.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_child_workflow_ships_each_item_via_child_sagas() {
    let h = TestHarness::new();

    let output = h
        .saga
        .run(TestHarness::input(), Variant::ChildWorkflow)
        .await
        .unwrap();

    assert!(!output.tracking_id.is_empty());
    assert_eq!(h.shipped_sorted(), vec![654300, 654321, 654322]);
}

#[tokio::test(start_paused = true)]
async fn test_item_shipment_failure_fails_the_saga_and_compensates() {
    let h = TestHarness::new();
    h.activities.set_fail_on_ship_item(654321);

    let err = h
        .saga
        .run(TestHarness::input(), Variant::HappyPath)
        .await
        .unwrap_err();

    match err {
        SagaError::Shipment { item_id, .. } => assert_eq!(item_id, 654321),
        other => panic!("unexpected error: {other}"),
    }

    // The siblings were still attempted to completion.
    assert_eq!(h.shipped_sorted(), vec![654300, 654322]);

    // Shipping is after payment capture, so the saga rolled back.
    let log = h.activities.call_log();
    assert!(log.contains(&"undo_charge_customer"));
    assert!(log.contains(&"undo_prepare_shipment"));
}

#[tokio::test(start_paused = true)]
async fn test_advanced_visibility_publishes_status_transitions() {
    let h = TestHarness::new();

    h.saga
        .run(TestHarness::input(), Variant::AdvancedVisibility)
        .await
        .unwrap();

    let order_id = OrderId::new("ORD-1");
    assert_eq!(
        h.visibility.order_status(&order_id),
        Some("Order Completed".to_string())
    );
    assert_eq!(
        h.visibility.search_by_status("Order Completed"),
        vec![order_id]
    );
}

#[tokio::test(start_paused = true)]
async fn test_other_variants_do_not_touch_the_visibility_index() {
    let h = TestHarness::new();

    h.saga
        .run(TestHarness::input(), Variant::HappyPath)
        .await
        .unwrap();

    assert!(h.visibility.order_status(&OrderId::new("ORD-1")).is_none());
}
