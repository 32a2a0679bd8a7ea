//! Order data model.

use common::OrderId;
use serde::{Deserialize, Serialize};

/// Input to an order fulfillment saga.
///
/// Owned exclusively by the saga for its lifetime. The address may be
/// corrected by a signal or update while the saga runs; the order id is
/// fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub order_id: OrderId,
    pub address: String,
}

impl OrderInput {
    /// Creates a new order input.
    pub fn new(order_id: impl Into<OrderId>, address: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            address: address.into(),
        }
    }
}

/// A single order line item. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub description: String,
    pub quantity: u32,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(id: i64, description: impl Into<String>, quantity: u32) -> Self {
        Self {
            id,
            description: description.into(),
            quantity,
        }
    }
}

/// Terminal value returned to the saga's caller on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOutput {
    pub tracking_id: String,
    pub address: String,
}

/// Payload of an address-correction signal or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderInput {
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_input_construction() {
        let input = OrderInput::new("ORD-1", "123 A St");
        assert_eq!(input.order_id.as_str(), "ORD-1");
        assert_eq!(input.address, "123 A St");
    }

    #[test]
    fn order_output_uses_camel_case_wire_names() {
        let output = OrderOutput {
            tracking_id: "abc-123".to_string(),
            address: "123 A St".to_string(),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["trackingId"], "abc-123");
        assert_eq!(json["address"], "123 A St");
    }

    #[test]
    fn order_item_serialization_roundtrip() {
        let item = OrderItem::new(654321, "Table Legs", 2);
        let json = serde_json::to_string(&item).unwrap();
        let deserialized: OrderItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }
}
