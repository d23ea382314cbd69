// ============================================================================
// Health Route
// ============================================================================
//
// GET /health - liveness probe pinging the database pool.
//
// ============================================================================

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::context::AppContext;

/// GET /health
/// Health check endpoint
pub async fn health_check(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(ctx.db_pool.as_ref()).await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
        }
    }
}
