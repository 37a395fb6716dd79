//! Configuration file management

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use novelvault_core::NovelvaultConfig;

use super::load_config;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init(InitArgs),
    /// Print the resolved config (database password masked)
    Show,
    /// Show config file path
    Path,
    /// Check the resolved config
    Validate,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args, resolve_path(config_path)),
        ConfigCommands::Show => run_show(config_path),
        ConfigCommands::Path => {
            println!("{}", resolve_path(config_path).display());
            Ok(())
        }
        ConfigCommands::Validate => run_validate(config_path),
    }
}

fn resolve_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(NovelvaultConfig::default_path)
}

fn run_init(args: InitArgs, path: PathBuf) -> Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!(
            "Config already exists at {}\n\nUse --force to overwrite",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = NovelvaultConfig::default().to_toml()?;
    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Created config at: {}", path.display());
    println!("Set DATABASE_URL or [database].url before running `novelvault serve`.");
    Ok(())
}

fn run_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let text = config
        .redacted()
        .to_toml()
        .context("Failed to serialize config to TOML")?;
    println!("{text}");
    Ok(())
}

fn run_validate(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;
    match config.database_url() {
        Ok(_) => println!("database url: set"),
        Err(_) => println!("database url: not set"),
    }
    println!("Configuration valid");
    Ok(())
}
