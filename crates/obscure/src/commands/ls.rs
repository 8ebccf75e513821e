//! List command

use std::path::Path;

use anyhow::Result;
use obscure_core::{group_by_tag, BackupExtension, ObjectKey};

use crate::cli::LsArgs;
use crate::output;

pub async fn run(args: LsArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let (provider_key, provider) = super::connect_provider(&config, args.provider.as_deref()).await?;

    let prefix = match &args.tag {
        Some(tag) => ObjectKey::prefix_for(&config.username, tag),
        None => ObjectKey::user_prefix(&config.username),
    };

    let keys = provider.list(&prefix).await?;
    let grouped = group_by_tag(&keys);

    if grouped.is_empty() {
        output::info(&format!(
            "No backups found for {} on {}",
            config.username, provider_key
        ));
        return Ok(());
    }

    for (tag, versions) in &grouped {
        output::header(tag);
        for object_key in versions {
            let size = provider.size(&object_key.to_key()).await?;
            let mode = match object_key.extension {
                BackupExtension::Tar => "direct",
                BackupExtension::Obscure => "encrypted",
            };
            output::kv(
                &object_key.version,
                &format!("{} ({})", mode, output::human_bytes(size)),
            );
        }
    }

    Ok(())
}
