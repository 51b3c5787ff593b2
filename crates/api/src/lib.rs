//! HTTP API server with observability for the Northwind order repository.
//!
//! Provides REST endpoints over the order aggregate repository, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::{OrderAggregateRepository, RepositoryConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use store::NorthwindStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: NorthwindStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/orders",
            get(routes::orders::list::<S>).post(routes::orders::add::<S>),
        )
        .route(
            "/api/orders/{order_id}",
            get(routes::orders::get::<S>)
                .put(routes::orders::update::<S>)
                .delete(routes::orders::remove::<S>),
        )
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

/// Creates the application state around a store, tuned by `config`.
pub fn create_default_state<S: NorthwindStore + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let repository = OrderAggregateRepository::with_config(
        store,
        RepositoryConfig {
            list_concurrency: config.list_concurrency,
        },
    );

    Arc::new(AppState { repository })
}
