//! Remove-tag command

use std::path::Path;

use anyhow::Result;
use obscure::pipeline;
use obscure_core::ObjectKey;

use crate::cli::RmdirArgs;
use crate::output;

pub async fn run(args: RmdirArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let (_, provider) = super::connect_provider(&config, args.provider.as_deref()).await?;

    let prefix = ObjectKey::prefix_for(&config.username, &args.tag);
    let existing = provider.list(&prefix).await?;
    if existing.is_empty() {
        anyhow::bail!("no backups stored under tag '{}'", args.tag);
    }

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete all {} version(s) under tag '{}' from {}?",
                existing.len(),
                args.tag,
                provider.name()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output::info("Aborted");
            return Ok(());
        }
    }

    let deleted = pipeline::delete_tag(provider.as_ref(), &config.username, &args.tag).await?;

    output::success(&format!(
        "Deleted {} version(s) under tag '{}'",
        deleted.len(),
        args.tag
    ));
    Ok(())
}
