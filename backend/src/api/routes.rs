//! Route definitions for the API.

use axum::{middleware, routing::get, Router};

use super::handlers;
use super::middleware::auth::write_guard_middleware;
use super::middleware::tracing::correlation_id_middleware;
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    if state.config.require_auth_for_writes {
        tracing::info!("Token authentication required for log record writes");
    }

    let log_routes = handlers::log_records::router().layer(middleware::from_fn_with_state(
        state.clone(),
        write_guard_middleware,
    ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/swagger.json", get(super::openapi::swagger_json))
        .merge(handlers::auth::router())
        .merge(log_routes)
        .layer(middleware::from_fn(correlation_id_middleware))
        .with_state(state)
}
