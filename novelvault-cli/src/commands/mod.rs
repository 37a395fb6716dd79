//! Subcommand implementations

pub mod config;
pub mod migrate;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use novelvault_core::NovelvaultConfig;

pub use config::run_config;
pub use migrate::run_migrate;
pub use serve::run_serve;

/// Load the config file (explicit or default) with env overrides applied
pub fn load_config(path: Option<&Path>) -> Result<NovelvaultConfig> {
    let shown = path
        .map(Path::to_path_buf)
        .unwrap_or_else(NovelvaultConfig::default_path);
    NovelvaultConfig::load(path).with_context(|| format!("Failed to load config from {}", shown.display()))
}
