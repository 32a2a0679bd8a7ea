//! Shared types for the order fulfillment system.

pub mod types;

pub use types::OrderId;
