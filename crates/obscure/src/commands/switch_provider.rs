//! Switch-provider command

use std::path::Path;

use anyhow::{Context, Result};
use obscure_core::AppConfig;

use crate::cli::SwitchProviderArgs;
use crate::output;

pub fn run(args: SwitchProviderArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = super::load_config(config_path)?;

    // Refuse to default to something unusable
    config.provider(&args.provider)?;

    config.default_provider = Some(args.provider.clone());

    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => AppConfig::default_path()?,
    };
    let contents = serde_json::to_string_pretty(&config)?;
    std::fs::write(&path, contents)
        .with_context(|| format!("could not write config file {}", path.display()))?;

    output::success(&format!("Default provider is now {}", args.provider));
    Ok(())
}
