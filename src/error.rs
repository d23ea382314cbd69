use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::rate_limit::RateLimitDecision;
use crate::utils::insert_numeric_header;

/// Gateway error taxonomy.
///
/// Parameter-level problems are rejected before any store access; store
/// failures are logged with full detail server-side and surfaced to the
/// caller only as a generic message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("invalid resource: {requested}")]
    InvalidResource {
        requested: String,
        allowed: Vec<&'static str>,
    },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("rate limit exceeded")]
    RateLimited(RateLimitDecision),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidResource { .. } | ApiError::InvalidFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ApiError::InvalidResource { .. } => "INVALID_RESOURCE",
            ApiError::InvalidFormat(_) => "INVALID_FORMAT",
            ApiError::RateLimited(_) => "RATE_LIMIT_EXCEEDED",
            ApiError::Database(_) => "UPSTREAM_DATA_ERROR",
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            ApiError::MethodNotAllowed => "Method not allowed. Use GET.".to_string(),
            ApiError::InvalidResource { requested, .. } => format!(
                "Invalid resource '{}'. See allowedResources for valid values.",
                requested
            ),
            ApiError::InvalidFormat(format) => {
                format!("Invalid format '{}'. Use 'json' or 'csv'.", format)
            }
            ApiError::RateLimited(decision) => format!(
                "Rate limit exceeded. Try again in {} seconds.",
                decision.retry_after_secs()
            ),
            ApiError::Database(_) => "Unable to retrieve data".to_string(),
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(
                error = %self,
                error_code = %code,
                "Rate limit exceeded"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let mut body = json!({
            "error": self.user_message(),
            "errorCode": self.error_code(),
            "status": status.as_u16(),
        });

        // The whitelist enumeration, with each resource's projected columns,
        // aids client self-correction.
        if let ApiError::InvalidResource { allowed, .. } = &self {
            body["allowedResources"] = json!(allowed);
            body["resources"] = crate::resources::projection_summary();
        }

        let mut response = (status, axum::Json(body)).into_response();

        if let ApiError::RateLimited(decision) = &self {
            let headers = response.headers_mut();
            insert_numeric_header(headers, "x-ratelimit-limit", decision.limit as i64);
            insert_numeric_header(headers, "x-ratelimit-remaining", 0);
            insert_numeric_header(headers, "x-ratelimit-reset", decision.reset_at.timestamp());
            insert_numeric_header(headers, "retry-after", decision.retry_after_secs());
        }

        response
    }
}
