//! Axum server setup
//!
//! - Localhost-only CORS by default
//! - Tracing and request timeout middleware
//! - Background purge of expired sessions and rate-limit hits
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use novelvault_core::config::NovelvaultConfig;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::db::repos::SessionRepo;
use crate::pages;
use crate::state::AppState;

/// How often expired sessions and stale rate-limit hits are removed
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(300);

/// Build the full application: JSON API, pages and sitemap
pub fn build_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    let cors = if server.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins(&server.base_url))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::novels::router())
        .merge(routes::rankings::router())
        .merge(routes::search::router())
        .merge(routes::chapters::router())
        .merge(routes::comments::router())
        .merge(routes::bookmarks::router())
        .merge(routes::ratings::router())
        .merge(routes::history::router())
        .merge(routes::users::router())
        .merge(routes::auth::router())
        .merge(routes::sitemap::router())
        .merge(pages::router())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Localhost origins plus the configured public origin
fn allowed_origins(base_url: &str) -> Vec<HeaderValue> {
    let mut origins = vec![
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];
    match HeaderValue::from_str(base_url.trim_end_matches('/')) {
        Ok(origin) if !origins.contains(&origin) => origins.push(origin),
        Ok(_) => {}
        Err(_) => tracing::warn!(base_url, "base_url is not a valid origin header"),
    }
    origins
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&database_url).await?;
/// run_server(pool, NovelvaultConfig::default()).await?;
/// ```
pub async fn run_server(pool: PgPool, config: NovelvaultConfig) -> Result<(), ServerError> {
    let bind_addr = config.server.bind;
    let state = Arc::new(AppState::new(pool, config));
    tracing::info!(
        rate_limit_backend = %state.rate_limiter.backend(),
        base_url = state.base_url(),
        "state ready"
    );

    let maintenance = tokio::spawn(maintenance_loop(Arc::clone(&state)));
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    maintenance.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn maintenance_loop(state: Arc<AppState>) {
    let mut tick = tokio::time::interval(MAINTENANCE_INTERVAL);
    tick.tick().await;
    loop {
        tick.tick().await;

        match SessionRepo::new(&state.pool).purge_expired().await {
            Ok(n) if n > 0 => tracing::info!(removed = n, "expired sessions purged"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "session purge failed"),
        }
        match state.rate_limiter.purge(&state.rate_limit_policy()).await {
            Ok(n) if n > 0 => tracing::debug!(removed = n, "stale rate limit hits purged"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "rate limit purge failed"),
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
