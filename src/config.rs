use anyhow::{Context, Result};

// ============================================================================
// Configuration Constants
// ============================================================================

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

// Public API budget: 100 requests per client per hour.
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 3600;

/// Cache lifetime advertised to clients and intermediaries (seconds).
pub const CACHE_MAX_AGE_SECONDS: u64 = 300;

/// Filename prefix for CSV downloads: `<prefix>-<resource>.csv`.
pub const CSV_FILENAME_PREFIX: &str = "ai-act";

// ============================================================================
// Configuration Structures
// ============================================================================

/// Rate limit policy for the public gateway.
///
/// Window length and max-request count are configuration, never request
/// input.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub rate_limit: RateLimitConfig,
    pub rust_log: String,
}

impl Config {
    /// Loads configuration from environment variables, applying defaults for
    /// everything except `DATABASE_URL`.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        Ok(Self {
            database_url,
            port: env_or("PORT", DEFAULT_PORT)?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            rate_limit: RateLimitConfig {
                max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", DEFAULT_RATE_LIMIT_MAX_REQUESTS)?,
                window_seconds: env_or(
                    "RATE_LIMIT_WINDOW_SECONDS",
                    DEFAULT_RATE_LIMIT_WINDOW_SECONDS,
                )?,
            },
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}", name)),
        Err(_) => Ok(default),
    }
}
