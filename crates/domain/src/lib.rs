//! Domain layer for the order fulfillment system.
//!
//! This crate provides the order data model (inputs, items, outputs,
//! correction messages) and the closed set of saga variants that select
//! which behavioral branch a fulfillment run executes.

pub mod order;
pub mod variant;

pub use order::{OrderInput, OrderItem, OrderOutput, UpdateOrderInput};
pub use variant::{UnknownVariant, Variant};
