//! Order fulfillment saga constants.

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// Step name: Fetch the order's item list.
pub const STEP_GET_ITEMS: &str = "get_items";

/// Step name: Score the order for fraud.
pub const STEP_CHECK_FRAUD: &str = "check_fraud";

/// Step name: Book the shipment with the carrier.
pub const STEP_PREPARE_SHIPMENT: &str = "prepare_shipment";

/// Step name: Capture payment for the order.
pub const STEP_CHARGE_CUSTOMER: &str = "charge_customer";

/// Step name: Ship a single order item.
pub const STEP_SHIP_ORDER: &str = "ship_order";

/// Compensation name: Release a booked shipment.
pub const STEP_UNDO_PREPARE_SHIPMENT: &str = "undo_prepare_shipment";

/// Compensation name: Refund a captured payment.
pub const STEP_UNDO_CHARGE_CUSTOMER: &str = "undo_charge_customer";

/// Status shown while the fraud check runs.
pub const STATUS_CHECK_FRAUD: &str = "Check Fraud";

/// Status shown while the shipment is booked.
pub const STATUS_PREPARE_SHIPMENT: &str = "Prepare Shipment";

/// Status shown while payment is captured.
pub const STATUS_CHARGE_CUSTOMER: &str = "Charge Customer";

/// Status shown while items ship.
pub const STATUS_SHIP_ORDER: &str = "Ship Order";

/// Terminal status of a successful run.
pub const STATUS_ORDER_COMPLETED: &str = "Order Completed";
