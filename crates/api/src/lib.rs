//! HTTP API over the order document store.
//!
//! Exposes order lookup by code, date-window order export, and customer
//! profile lookup, scoring and deletion, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use document_store::DocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{CustomerLookup, OrderExport, OrderLookup};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        // Static segments win over captures, so an order coded `export` is
        // only reachable through the export listing.
        .route("/orders/export", get(routes::orders::export::<S>))
        .route("/orders/{order_code}", get(routes::orders::get::<S>))
        .route(
            "/customers/by-order/{order_id}",
            get(routes::customers::by_order::<S>),
        )
        .route(
            "/customers/{id}",
            get(routes::customers::get::<S>).delete(routes::customers::delete::<S>),
        )
        .route("/customers/{id}/rfm", get(routes::customers::rfm_summary::<S>))
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

/// Wires the lookup and export services over a single document store.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(
    store: S,
    backend: &'static str,
    config: &Config,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        backend,
        orders: OrderLookup::new(store.clone()),
        customers: CustomerLookup::new(store.clone()),
        export: OrderExport::new(store, config.export_options()),
    })
}
