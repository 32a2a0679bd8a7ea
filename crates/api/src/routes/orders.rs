//! Order fulfillment endpoints: start a saga, observe it, steer it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{OrderInput, OrderOutput, UpdateOrderInput, Variant};
use saga::{InMemoryVisibilityIndex, OrderActivities, OrderSaga, SagaHandle};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A registered saga run: its interaction channels plus the slot its
/// terminal result lands in.
#[derive(Clone)]
pub struct SagaEntry {
    pub variant: Variant,
    pub started_at: DateTime<Utc>,
    pub handle: SagaHandle,
    outcome: Arc<RwLock<Option<Result<OrderOutput, String>>>>,
}

impl SagaEntry {
    /// Returns the terminal result, if the saga has reached one.
    pub fn outcome(&self) -> Option<Result<OrderOutput, String>> {
        self.outcome.read().unwrap().clone()
    }
}

/// Shared application state accessible from all handlers.
pub struct AppState<A: OrderActivities> {
    pub activities: Arc<A>,
    pub visibility: Arc<InMemoryVisibilityIndex>,
    sagas: RwLock<HashMap<OrderId, SagaEntry>>,
}

impl<A: OrderActivities + 'static> AppState<A> {
    /// Creates application state around the given activities.
    pub fn new(activities: A) -> Self {
        Self {
            activities: Arc::new(activities),
            visibility: Arc::new(InMemoryVisibilityIndex::new()),
            sagas: RwLock::new(HashMap::new()),
        }
    }

    fn saga(&self, order_id: &OrderId) -> Result<SagaEntry, ApiError> {
        self.sagas
            .read()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("No saga for order {order_id}")))
    }
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOrderRequest {
    pub order_id: String,
    pub address: String,
    pub variant: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOrderResponse {
    pub order_id: OrderId,
    pub variant: String,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub progress: u8,
    pub status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub order_id: OrderId,
    pub variant: String,
    pub started_at: DateTime<Utc>,
    pub progress: u8,
    pub status: String,
    pub output: Option<OrderOutput>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateOrderResponse {
    pub message: String,
}

// -- Handlers --

/// POST /orders — starts an order fulfillment saga.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id))]
pub async fn start<A: OrderActivities + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Json(req): Json<StartOrderRequest>,
) -> Result<(StatusCode, Json<StartOrderResponse>), ApiError> {
    let variant = match &req.variant {
        Some(name) => name
            .parse::<Variant>()
            .map_err(|err| ApiError::BadRequest(err.to_string()))?,
        None => Variant::default(),
    };

    let order_id = OrderId::new(req.order_id.as_str());
    let input = OrderInput::new(order_id.clone(), req.address.as_str());

    let saga = OrderSaga::new(
        Arc::clone(&state.activities),
        Arc::clone(&state.visibility),
    );
    let outcome = Arc::new(RwLock::new(None));
    let entry = SagaEntry {
        variant,
        started_at: Utc::now(),
        handle: saga.handle(),
        outcome: Arc::clone(&outcome),
    };

    {
        let mut sagas = state.sagas.write().unwrap();
        if sagas.contains_key(&order_id) {
            return Err(ApiError::Conflict(format!(
                "Order {order_id} is already being fulfilled"
            )));
        }
        sagas.insert(order_id.clone(), entry);
    }

    metrics::counter!("orders_started_total").increment(1);
    tokio::spawn(async move {
        let result = saga.run(input, variant).await;
        *outcome.write().unwrap() = Some(result.map_err(|err| err.to_string()));
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StartOrderResponse {
            order_id,
            variant: variant.to_string(),
        }),
    ))
}

/// GET /orders/{id} — full status of a saga, including its terminal
/// result once available.
pub async fn get<A: OrderActivities + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderStatusResponse>, ApiError> {
    let order_id = OrderId::new(id);
    let entry = state.saga(&order_id)?;

    let snapshot = entry.handle.query();
    let (output, error) = match entry.outcome() {
        Some(Ok(output)) => (Some(output), None),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };

    Ok(Json(OrderStatusResponse {
        order_id,
        variant: entry.variant.to_string(),
        started_at: entry.started_at,
        progress: snapshot.progress,
        status: snapshot.status,
        output,
        error,
    }))
}

/// GET /orders/{id}/progress — the saga's synchronous progress query.
pub async fn progress<A: OrderActivities + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let entry = state.saga(&OrderId::new(id))?;
    let snapshot = entry.handle.query();
    Ok(Json(ProgressResponse {
        progress: snapshot.progress,
        status: snapshot.status,
    }))
}

/// POST /orders/{id}/signal — fire-and-forget address correction.
pub async fn signal<A: OrderActivities + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderInput>,
) -> Result<StatusCode, ApiError> {
    let entry = state.saga(&OrderId::new(id))?;
    entry.handle.signal_update_order(req.address);
    Ok(StatusCode::ACCEPTED)
}

/// POST /orders/{id}/update — validated address correction with a
/// synchronous confirmation.
pub async fn update<A: OrderActivities + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderInput>,
) -> Result<Json<UpdateOrderResponse>, ApiError> {
    let entry = state.saga(&OrderId::new(id))?;
    let message = entry.handle.update_order(&req.address)?;
    Ok(Json(UpdateOrderResponse { message }))
}

/// GET /orders?status=... — searches the visibility index for orders
/// whose published status matches.
pub async fn search<A: OrderActivities + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<OrderId>> {
    Json(state.visibility.search_by_status(&params.status))
}
