//! HTTP surface for the order fulfillment system.
//!
//! Exposes the saga's external capabilities over REST: start a
//! fulfillment run, query its progress, deliver signal/update address
//! corrections, inspect the terminal result, and search the visibility
//! index. Structured logging (tracing) and Prometheus metrics included.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{OrderActivities, SimulatedOrderActivities};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<A: OrderActivities + 'static>(
    state: Arc<AppState<A>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::start::<A>))
        .route("/orders", get(routes::orders::search::<A>))
        .route("/orders/{id}", get(routes::orders::get::<A>))
        .route("/orders/{id}/progress", get(routes::orders::progress::<A>))
        .route("/orders/{id}/signal", post(routes::orders::signal::<A>))
        .route("/orders/{id}/update", post(routes::orders::update::<A>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state backed by the simulated order
/// services.
pub fn create_default_state() -> Arc<AppState<SimulatedOrderActivities>> {
    Arc::new(AppState::new(SimulatedOrderActivities::new()))
}
