//! Restore command

use std::path::Path;

use anyhow::Result;
use obscure::pipeline;
use obscure_core::BackupExtension;

use crate::cli::RestoreArgs;
use crate::output;

pub async fn run(args: RestoreArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let (_, provider) = super::connect_provider(&config, args.provider.as_deref()).await?;

    // Resolve the key first so we only prompt for a password when the
    // stored object is actually encrypted
    let object_key = match &args.version {
        Some(version) => {
            pipeline::resolve_versioned_key(
                provider.as_ref(),
                &config.username,
                &args.tag,
                version,
            )
            .await?
        }
        None => pipeline::latest_version(provider.as_ref(), &config.username, &args.tag).await?,
    };

    let password = match object_key.extension {
        BackupExtension::Tar => None,
        BackupExtension::Obscure => match args.password.clone() {
            Some(p) => Some(p),
            None => Some(super::prompt_password(false)?),
        },
    };

    let mut progress = obscure_archive::PipelineProgress::new();
    progress.start_phase(&format!("Restoring {}...", object_key.to_key()));

    let outcome = pipeline::restore_from_provider(
        provider.as_ref(),
        &config.username,
        &args.tag,
        Some(&object_key.version),
        password.as_deref(),
        &args.output,
    )
    .await;
    progress.finish_all();
    let outcome = outcome?;

    output::success(&format!(
        "Restored {} ({} entr{}) to {}",
        outcome.key,
        outcome.entries_restored,
        if outcome.entries_restored == 1 { "y" } else { "ies" },
        outcome.output_path.display()
    ));

    Ok(())
}
