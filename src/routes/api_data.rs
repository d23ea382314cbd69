// ============================================================================
// Public Data Gateway
// ============================================================================
//
// GET /api-data?resource=<name>&format=<json|csv>&id=<int>
//
// Per-request flow: preflight -> method check -> rate limit -> validate ->
// resolve -> serialize. Cross-cutting headers (CORS, caching, security) are
// attached by middleware; this handler only adds the rate-limit telemetry
// computed here.
//
// ============================================================================

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config;
use crate::context::AppContext;
use crate::error::ApiError;
use crate::rate_limit::{self, RateLimitDecision};
use crate::serialize;
use crate::validate::{self, OutputFormat};
use crate::{db, resources, utils};

/// Scopes this endpoint's budget in the shared rate_limits table.
const RATE_LIMIT_ACTION: &str = "api_data";

pub async fn api_data(
    State(ctx): State<Arc<AppContext>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    headers: axum::http::HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // CORS preflight terminates before any store access.
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    if method != Method::GET {
        return ApiError::MethodNotAllowed.into_response();
    }

    // Clients not behind a proxy are identified by their peer address, so
    // every direct client gets its own budget rather than a shared bucket.
    let client_ip = utils::extract_client_ip(&headers, Some(peer.ip()));

    let decision = rate_limit::enforce(
        ctx.db_pool.as_ref(),
        &client_ip,
        RATE_LIMIT_ACTION,
        ctx.config.rate_limit.max_requests,
        ctx.config.rate_limit.window_seconds,
    )
    .await;

    if let Some(d) = &decision {
        if !d.allowed {
            tracing::warn!(ip = %client_ip, limit = d.limit, "Rate limit exceeded");
            // The 429 carries its own telemetry headers, including Retry-After.
            return ApiError::RateLimited(d.clone()).into_response();
        }
    }

    let response = handle_query(&ctx, &params)
        .await
        .unwrap_or_else(|e| e.into_response());

    attach_rate_limit_headers(response, decision.as_ref())
}

async fn handle_query(
    ctx: &AppContext,
    params: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let query = validate::validate(params)?;
    let resource = query.resource;

    let data: Value = if resource.table.is_none() {
        resources::metadata_document()
    } else if let (Some(id), Some(_)) = (query.id, resource.singleton_key) {
        match db::fetch_singleton(ctx.db_pool.as_ref(), resource, id).await? {
            Some(record) => record,
            None => Value::Null,
        }
    } else {
        Value::Array(db::fetch_collection(ctx.db_pool.as_ref(), resource).await?)
    };

    // CSV applies only to a non-empty collection; anything else silently
    // degrades to the JSON envelope.
    if query.format == OutputFormat::Csv {
        if let Value::Array(rows) = &data {
            if let Some(csv) = serialize::to_csv(rows) {
                let disposition = format!(
                    "attachment; filename=\"{}-{}.csv\"",
                    config::CSV_FILENAME_PREFIX,
                    resource.name
                );
                return Ok((
                    StatusCode::OK,
                    [
                        (header::CONTENT_TYPE, "text/csv".to_string()),
                        (header::CONTENT_DISPOSITION, disposition),
                    ],
                    csv,
                )
                    .into_response());
            }
        }
    }

    let envelope = serialize::envelope(resource, data);
    Ok((StatusCode::OK, axum::Json(envelope)).into_response())
}

/// Attaches X-RateLimit-* telemetry to a terminal response. Skipped when the
/// limiter failed open and no decision was computed.
fn attach_rate_limit_headers(
    mut response: Response,
    decision: Option<&RateLimitDecision>,
) -> Response {
    if let Some(d) = decision {
        let headers = response.headers_mut();
        utils::insert_numeric_header(headers, "x-ratelimit-limit", d.limit as i64);
        utils::insert_numeric_header(headers, "x-ratelimit-remaining", d.remaining as i64);
        utils::insert_numeric_header(headers, "x-ratelimit-reset", d.reset_at.timestamp());
    }
    response
}
