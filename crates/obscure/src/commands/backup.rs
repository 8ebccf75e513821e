//! Backup command

use std::path::Path;

use anyhow::Result;
use chrono::Local;
use obscure::pipeline;
use obscure_archive::PipelineProgress;
use obscure_core::{auto_version, BackupRequest};
use obscure_storage::{FallbackUpload, StorageProvider};

use crate::cli::BackupArgs;
use crate::output;

pub async fn run(args: BackupArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;

    let version = args
        .version
        .clone()
        .unwrap_or_else(|| auto_version(Local::now()));

    let password = if args.direct {
        None
    } else {
        match args.password.clone() {
            Some(p) => Some(p),
            None => Some(super::prompt_password(true)?),
        }
    };

    let mut request = BackupRequest {
        source_path: args.path.clone(),
        tag: args.tag.clone(),
        version,
        direct: args.direct,
        provider_key: String::new(),
        username: config.username.clone(),
    };

    if args.all_providers {
        let mut targets: Vec<pipeline::BackupTarget> = Vec::new();
        for key in config.enabled_provider_keys() {
            let entry = config.provider(&key)?;
            let fallback = super::fallback_for(entry)
                .map(|u| Box::new(u) as Box<dyn FallbackUpload>);
            targets.push((
                key.clone(),
                obscure_storage::create_provider(entry).await?,
                fallback,
            ));
        }

        if targets.is_empty() {
            anyhow::bail!("no enabled providers to back up to");
        }

        let results = pipeline::backup_to_all(&targets, &request, password.as_deref()).await;

        output::header("Backup results");
        let mut failures = 0;
        for (key, outcome) in &results {
            match outcome {
                Ok(o) => output::kv(key, &format!("{} ({})", o.key, output::human_bytes(o.bytes_uploaded))),
                Err(e) => {
                    failures += 1;
                    output::kv(key, &format!("failed: {}", e));
                }
            }
        }

        if let Some(retain) = args.retain {
            for ((key, outcome), (_, provider, _)) in results.iter().zip(&targets) {
                if outcome.is_ok() {
                    prune(provider.as_ref(), &config.username, &args.tag, retain, key).await;
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{} of {} providers failed", failures, results.len());
        }
        return Ok(());
    }

    let (provider_key, provider) = super::connect_provider(&config, args.provider.as_deref()).await?;
    request.provider_key = provider_key.clone();

    let fallback = super::fallback_for(config.provider(&provider_key)?);

    let mut progress = PipelineProgress::new();
    progress.start_phase(&format!(
        "Backing up {} to {}...",
        args.path.display(),
        provider.name()
    ));

    let outcome = pipeline::backup_to_provider(
        provider.as_ref(),
        fallback.as_ref().map(|u| u as &dyn FallbackUpload),
        &request,
        password.as_deref(),
    )
    .await;
    progress.finish_all();
    let outcome = outcome?;

    if outcome.used_cli_fallback {
        output::warning("SDK upload was rejected; the aws CLI fallback succeeded");
    }

    output::success(&format!(
        "Backed up {} to {} as {} ({})",
        args.path.display(),
        provider.name(),
        outcome.key,
        output::human_bytes(outcome.bytes_uploaded)
    ));

    if let Some(retain) = args.retain {
        prune(provider.as_ref(), &config.username, &args.tag, retain, &provider_key).await;
    }

    Ok(())
}

/// Run retention, reporting but never failing the backup that succeeded.
async fn prune(
    provider: &dyn StorageProvider,
    username: &str,
    tag: &str,
    retain: usize,
    provider_key: &str,
) {
    match obscure_storage::enforce(provider, username, tag, retain).await {
        Ok(report) if report.removed_anything() => {
            output::info(&format!(
                "Pruned {} old version(s) on {}",
                report.deleted.len(),
                provider_key
            ));
        }
        Ok(_) => {}
        Err(err) => {
            output::warning(&format!("retention sweep on {} failed: {}", provider_key, err));
        }
    }
}
