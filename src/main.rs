// ============================================================================
// Regulation Data Gateway
// ============================================================================
//
// Single entry point for third-party access to regulation content. The
// gateway is stateless: every invocation coordinates with its peers only
// through the persisted rate_limits table.
//
// ============================================================================

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lexgate::config::Config;
use lexgate::context::AppContext;
use lexgate::{db, rate_limit, routes};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Regulation Data Gateway Starting ===");
    info!("Port: {}", config.port);
    info!(
        "Rate limit: {} requests per {} seconds",
        config.rate_limit.max_requests, config.rate_limit.window_seconds
    );

    let db_pool = db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let ctx = Arc::new(AppContext::new(Arc::new(db_pool), config.clone()));

    // Expired rate-limit rows are reset in place on the next request from
    // the same client; rows for clients that went quiet need a sweeper.
    {
        let pool = ctx.db_pool.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match rate_limit::cleanup_rate_limits(&pool).await {
                    Ok(removed) if removed > 0 => {
                        info!(removed, "Cleaned up expired rate limit rows");
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Rate limit cleanup failed"),
                }
            }
        });
    }

    let app = routes::create_router(ctx);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Failed to parse bind address")?;

    info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    // Connect info is required so the gateway can identify direct clients
    // by peer address when no proxy headers are present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Failed to start server")?;

    Ok(())
}
