//! Remove command

use std::path::Path;

use anyhow::Result;
use obscure::pipeline;

use crate::cli::RmArgs;
use crate::output;

pub async fn run(args: RmArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let (_, provider) = super::connect_provider(&config, args.provider.as_deref()).await?;

    let object_key = pipeline::resolve_versioned_key(
        provider.as_ref(),
        &config.username,
        &args.tag,
        &args.version,
    )
    .await?;

    let key = object_key.to_key();
    provider.delete(&key).await?;

    output::success(&format!("Deleted {}", key));
    Ok(())
}
