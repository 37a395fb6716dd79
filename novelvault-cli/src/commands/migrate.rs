//! Schema migration command

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use novelvault_server::db::{create_pool, migrations};

use super::load_config;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }
    let database_url = config.database_url()?;

    let pool = create_pool(database_url)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool).await.context("Failed to run migrations")?;

    println!("Schema up to date:");
    for table in migrations::table_names() {
        println!("  {table}");
    }
    Ok(())
}
