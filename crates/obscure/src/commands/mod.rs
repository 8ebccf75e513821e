//! Command implementations

pub mod backup;
pub mod ls;
pub mod restore;
pub mod rm;
pub mod rmdir;
pub mod scheduler;
pub mod switch_provider;

use std::path::Path;

use anyhow::Result;
use obscure_core::{AppConfig, ProviderCredential, ProviderEntry, ProviderKind};
use obscure_storage::{CliUploader, StorageProvider, FILEBASE_ENDPOINT};

/// Load the config and connect the requested (or default) provider.
pub(crate) async fn connect_provider(
    config: &AppConfig,
    explicit: Option<&str>,
) -> Result<(String, Box<dyn StorageProvider>)> {
    let key = config.resolve_provider_key(explicit)?;
    let entry = config.provider(&key)?;
    let provider = obscure_storage::create_provider(entry).await?;
    Ok((key, provider))
}

/// Load the config from the CLI flag or the default location.
pub(crate) fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(AppConfig::load(path)?)
}

/// CLI fallback uploader for Filebase entries; other backends get none.
pub(crate) fn fallback_for(entry: &ProviderEntry) -> Option<CliUploader> {
    if entry.kind != ProviderKind::FilebaseIpfs {
        return None;
    }

    match &entry.credential {
        ProviderCredential::S3 {
            bucket,
            region,
            access_key_id,
            secret_access_key,
            endpoint,
        } => Some(CliUploader::new(
            bucket.clone(),
            endpoint.clone().unwrap_or_else(|| FILEBASE_ENDPOINT.to_string()),
            region.clone(),
            access_key_id.clone(),
            secret_access_key.clone(),
        )),
        ProviderCredential::Gcs { .. } => None,
    }
}

/// Interactively prompt for an encryption password.
pub(crate) fn prompt_password(confirm: bool) -> Result<String> {
    let mut prompt = dialoguer::Password::new().with_prompt("Encryption password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}
