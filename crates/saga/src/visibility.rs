//! Visibility index for externally searchable order status.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;

use crate::error::SagaError;

/// External index that makes order status searchable.
///
/// Under the advanced-visibility variant the saga upserts its status here
/// on every transition.
#[async_trait]
pub trait VisibilityIndex: Send + Sync {
    /// Upserts the keyword-indexed status attribute for an order.
    async fn upsert_order_status(
        &self,
        order_id: &OrderId,
        status: &str,
    ) -> Result<(), SagaError>;
}

/// In-memory visibility index for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVisibilityIndex {
    state: Arc<RwLock<HashMap<OrderId, String>>>,
}

impl InMemoryVisibilityIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the indexed status for an order, if any.
    pub fn order_status(&self, order_id: &OrderId) -> Option<String> {
        self.state.read().unwrap().get(order_id).cloned()
    }

    /// Returns the ids of all orders whose indexed status matches exactly.
    pub fn search_by_status(&self, status: &str) -> Vec<OrderId> {
        let state = self.state.read().unwrap();
        let mut ids: Vec<OrderId> = state
            .iter()
            .filter(|(_, indexed)| indexed.as_str() == status)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }
}

#[async_trait]
impl VisibilityIndex for InMemoryVisibilityIndex {
    async fn upsert_order_status(
        &self,
        order_id: &OrderId,
        status: &str,
    ) -> Result<(), SagaError> {
        self.state
            .write()
            .unwrap()
            .insert(order_id.clone(), status.to_string());
        Ok(())
    }
}
