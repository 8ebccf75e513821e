//! Scheduler command

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use obscure::{pipeline, resolve_passphrase, ScheduleSpec, Scheduler};
use obscure_core::{auto_version, BackupRequest, Error};
use obscure_storage::{FallbackUpload, StorageProvider};

use crate::cli::SchedulerArgs;
use crate::output;

pub async fn run(args: SchedulerArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;

    args.version_policy.ensure_supported()?;

    let spec = match (&args.time, args.every, &args.cron) {
        (Some(time), None, None) => ScheduleSpec::daily_from_str(time)?,
        (None, Some(minutes), None) => ScheduleSpec::EveryMinutes(minutes),
        (None, None, Some(expr)) => ScheduleSpec::Cron(expr.clone()),
        _ => {
            return Err(
                Error::config("specify exactly one of --time, --every, or --cron").into(),
            );
        }
    };

    // Fail on a missing passphrase at startup, not at the first run
    let passphrase = if args.direct {
        None
    } else {
        Some(resolve_passphrase(args.passphrase_file.as_deref())?)
    };

    let (provider_key, provider) = super::connect_provider(&config, args.provider.as_deref()).await?;
    let provider: Arc<dyn StorageProvider> = Arc::from(provider);
    let fallback = super::fallback_for(config.provider(&provider_key)?).map(Arc::new);

    output::info(&format!(
        "Scheduling backups of {} (tag '{}') to {}",
        args.path.display(),
        args.tag,
        provider_key
    ));

    let username = config.username.clone();
    let scheduler = Scheduler::new(&spec)?;

    scheduler
        .run(|| {
            let provider = Arc::clone(&provider);
            let fallback = fallback.clone();
            let passphrase = passphrase.clone();
            let username = username.clone();
            let tag = args.tag.clone();
            let path = args.path.clone();
            let provider_key = provider_key.clone();
            let direct = args.direct;
            let retain = args.retain.unwrap_or(obscure_storage::DEFAULT_RETAIN);

            async move {
                let request = BackupRequest {
                    source_path: path,
                    tag: tag.clone(),
                    version: auto_version(Local::now()),
                    direct,
                    provider_key,
                    username: username.clone(),
                };

                let outcome = pipeline::backup_to_provider(
                    provider.as_ref(),
                    fallback.as_deref().map(|u| u as &dyn FallbackUpload),
                    &request,
                    passphrase.as_deref(),
                )
                .await?;
                tracing::info!(key = outcome.key.as_str(), "scheduled backup uploaded");

                let report =
                    obscure_storage::enforce(provider.as_ref(), &username, &tag, retain).await?;
                if report.removed_anything() {
                    tracing::info!(
                        pruned = report.deleted.len(),
                        tag = tag.as_str(),
                        "pruned old versions"
                    );
                }

                Ok(())
            }
        })
        .await?;

    Ok(())
}
