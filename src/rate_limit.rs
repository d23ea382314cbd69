//! Rate Limiting Module
//!
//! Sliding-window rate limiting persisted in PostgreSQL. Invocations of the
//! gateway share no in-process state, so the rate_limits table is the only
//! coordination point between concurrent requests.
//!
//! The check-and-increment is a single conditional upsert: the counter
//! increment, the window reset and the post-increment read happen in one
//! statement. A select-then-update sequence here would admit more than
//! max_requests under concurrency (two requests both observing a count below
//! the limit); the upsert serializes concurrent checks on the row instead.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

/// Outcome of a rate limit check for one request.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Instant at which the current window expires and the budget resets.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Seconds until `reset_at`, rounded up and clamped to at least 1 so a
    /// client that sleeps the advertised duration lands in the next window.
    pub fn retry_after_secs(&self) -> i64 {
        let millis = (self.reset_at - Utc::now()).num_milliseconds();
        ((millis + 999) / 1000).max(1)
    }
}

#[derive(sqlx::FromRow)]
struct RateLimitRow {
    request_count: i32,
    window_start: DateTime<Utc>,
}

/// Checks and consumes one unit of the identifier's budget for `action`.
///
/// Rows whose window has elapsed are reset in place rather than deleted; the
/// periodic cleanup removes rows for clients that stopped sending traffic.
pub async fn check_rate_limit(
    pool: &PgPool,
    identifier: &str,
    action: &str,
    max_requests: u32,
    window_seconds: u64,
) -> Result<RateLimitDecision, sqlx::Error> {
    let row = sqlx::query_as::<_, RateLimitRow>(
        r#"
        INSERT INTO rate_limits (identifier, action, request_count, window_start)
        VALUES ($1, $2, 1, NOW())
        ON CONFLICT (identifier, action) DO UPDATE
        SET request_count = CASE
            WHEN rate_limits.window_start < NOW() - ($3 * INTERVAL '1 second') THEN 1
            ELSE rate_limits.request_count + 1
        END,
        window_start = CASE
            WHEN rate_limits.window_start < NOW() - ($3 * INTERVAL '1 second') THEN NOW()
            ELSE rate_limits.window_start
        END
        RETURNING request_count, window_start
        "#,
    )
    .bind(identifier)
    .bind(action)
    .bind(window_seconds as i64)
    .fetch_one(pool)
    .await?;

    let count = row.request_count.max(0) as u32;
    let reset_at = row.window_start + Duration::seconds(window_seconds as i64);

    if count > max_requests {
        Ok(RateLimitDecision {
            allowed: false,
            limit: max_requests,
            remaining: 0,
            reset_at,
        })
    } else {
        Ok(RateLimitDecision {
            allowed: true,
            limit: max_requests,
            remaining: max_requests - count,
            reset_at,
        })
    }
}

/// Fail-open wrapper around [`check_rate_limit`].
///
/// Store failures are logged and return `None`: the limiter protects the
/// data tier, it must not take the gateway down with it. Callers omit the
/// rate-limit telemetry headers when no decision was computed.
pub async fn enforce(
    pool: &PgPool,
    identifier: &str,
    action: &str,
    max_requests: u32,
    window_seconds: u64,
) -> Option<RateLimitDecision> {
    match check_rate_limit(pool, identifier, action, max_requests, window_seconds).await {
        Ok(decision) => Some(decision),
        Err(e) => {
            tracing::error!(
                error = %e,
                identifier = %identifier,
                action = %action,
                "Rate limit check failed, failing open"
            );
            None
        }
    }
}

/// Cleanup old rate limit entries (call periodically)
pub async fn cleanup_rate_limits(pool: &PgPool) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM rate_limits WHERE window_start < NOW() - INTERVAL '1 day'")
            .execute(pool)
            .await
            .context("Failed to cleanup rate limits")?;

    Ok(result.rows_affected())
}
