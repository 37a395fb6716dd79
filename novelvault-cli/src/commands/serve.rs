//! HTTP server command

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use novelvault_core::RateLimitBackend;
use novelvault_server::db::{create_pool_with_options, migrations};
use novelvault_server::run_server;

use super::load_config;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Public base URL used in the sitemap
    #[arg(long)]
    pub base_url: Option<String>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Where rate-limit hits are kept: postgres or memory
    #[arg(long)]
    pub rate_limit_backend: Option<RateLimitBackend>,

    /// Skip schema migrations at startup
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Run the HTTP server until shutdown
pub async fn run_serve(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(base_url) = args.base_url {
        config.server.base_url = base_url.trim_end_matches('/').to_string();
    }
    if args.cors_permissive {
        config.server.cors_permissive = true;
    }
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }
    if let Some(backend) = args.rate_limit_backend {
        config.rate_limit.backend = backend;
    }
    config.validate().context("Invalid configuration")?;

    let database_url = config.database_url()?.to_string();
    tracing::info!(
        bind = %config.server.bind,
        rate_limit_backend = %config.rate_limit.backend,
        "Starting novelvault server"
    );

    let pool = create_pool_with_options(&database_url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    if args.skip_migrations {
        tracing::info!("Skipping migrations");
    } else {
        migrations::run(&pool).await.context("Failed to run migrations")?;
    }

    // blocks until Ctrl+C / SIGTERM
    run_server(pool, config).await.context("Server error")?;

    Ok(())
}
