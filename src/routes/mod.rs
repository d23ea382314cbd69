// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: router assembly and middleware layering
// - api_data.rs: the public data gateway (GET /api-data)
// - health.rs: health check endpoint
// - middleware.rs: request logging, cross-cutting response headers
//
// ============================================================================

mod api_data;
mod health;
mod middleware;

use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // All methods route to the handler so that 405 and preflight
        // responses still pass through the header middleware.
        .route("/api-data", any(api_data::api_data))
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .layer(axum::middleware::from_fn(middleware::add_gateway_headers))
                .into_inner(),
        )
        .with_state(app_context)
}
