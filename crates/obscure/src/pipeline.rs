//! Backup and restore orchestration.
//!
//! A backup flows archive -> compress -> encrypt -> upload; direct backups
//! skip the compress and encrypt stages. Restore runs the same stages in
//! reverse. Storage is injected as a trait object, so the pipeline never
//! cares which backend it is talking to.

use std::path::{Path, PathBuf};

use obscure_core::{BackupExtension, BackupMetadata, BackupRequest, Error, ObjectKey, Result};
use obscure_storage::{FallbackUpload, StorageProvider};
use tokio::io::AsyncReadExt;

/// Result of one backup upload.
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    /// Key the object was stored under
    pub key: String,
    /// Bytes sent to the provider
    pub bytes_uploaded: u64,
    /// Files included in the payload
    pub file_count: usize,
    /// True when the upload went through the AWS CLI fallback
    pub used_cli_fallback: bool,
}

/// Result of one restore.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// Key the object was fetched from
    pub key: String,
    /// Where the restored content landed
    pub output_path: PathBuf,
    /// Entries written (1 for a single-file backup)
    pub entries_restored: usize,
}

/// Run a full backup against one provider.
///
/// The target key is checked before any work happens; backups are
/// write-once and a colliding key aborts the run. Encrypted backups require
/// a password; direct backups ignore it.
pub async fn backup_to_provider(
    provider: &dyn StorageProvider,
    fallback: Option<&dyn FallbackUpload>,
    request: &BackupRequest,
    password: Option<&str>,
) -> Result<BackupOutcome> {
    let extension = BackupExtension::for_direct(request.direct);
    let object_key = ObjectKey::new(
        request.username.clone(),
        request.tag.clone(),
        request.version.clone(),
        extension,
    );
    let key = object_key.to_key();

    if provider.exists(&key).await? {
        return Err(Error::collision(key));
    }

    let password = match (request.direct, password) {
        (true, _) => None,
        (false, Some(p)) => Some(p),
        (false, None) => {
            return Err(Error::config(
                "a password is required for encrypted backups",
            ));
        }
    };

    tracing::debug!(source = %request.source_path.display(), key, "building payload");
    let archive = obscure_archive::create_archive(&request.source_path)?;

    let payload = match password {
        Some(p) => obscure_archive::seal(&archive.data, p)?,
        None => archive.data,
    };

    let metadata = BackupMetadata::from_request(request);
    let bytes_uploaded = payload.len() as u64;

    let mut used_cli_fallback = false;
    match fallback {
        Some(uploader) => match provider.upload(&key, payload.clone(), &metadata).await {
            Ok(()) => {}
            Err(err) if err.is_credential() => {
                tracing::warn!(
                    provider = provider.name(),
                    error = %err,
                    "SDK upload rejected, retrying through the aws CLI"
                );
                uploader.upload(&key, &payload, &metadata).await?;
                used_cli_fallback = true;
            }
            Err(err) => return Err(err),
        },
        None => provider.upload(&key, payload, &metadata).await?,
    }

    Ok(BackupOutcome {
        key,
        bytes_uploaded,
        file_count: archive.file_count,
        used_cli_fallback,
    })
}

/// One target of a multi-provider backup: label, backend, and the optional
/// CLI upload fallback for backends that have one.
pub type BackupTarget = (
    String,
    Box<dyn StorageProvider>,
    Option<Box<dyn FallbackUpload>>,
);

/// Run the same backup against several providers, collecting per-provider
/// outcomes. One failing provider never aborts the others.
pub async fn backup_to_all(
    targets: &[BackupTarget],
    request: &BackupRequest,
    password: Option<&str>,
) -> Vec<(String, Result<BackupOutcome>)> {
    let mut results = Vec::with_capacity(targets.len());

    for (name, provider, fallback) in targets {
        let mut per_provider = request.clone();
        per_provider.provider_key = name.clone();

        let outcome = backup_to_provider(
            provider.as_ref(),
            fallback.as_deref(),
            &per_provider,
            password,
        )
        .await;
        if let Err(err) = &outcome {
            tracing::error!(provider = name.as_str(), error = %err, "backup failed");
        }
        results.push((name.clone(), outcome));
    }

    results
}

/// Find the newest stored version for a (user, tag) pair.
pub async fn latest_version(
    provider: &dyn StorageProvider,
    username: &str,
    tag: &str,
) -> Result<ObjectKey> {
    let prefix = ObjectKey::prefix_for(username, tag);
    let keys = provider.list(&prefix).await?;

    keys.iter()
        .filter_map(|k| ObjectKey::parse(k))
        .max_by(|a, b| a.version.cmp(&b.version))
        .ok_or_else(|| Error::not_found(prefix))
}

/// Restore a backup into `dest`.
///
/// With no explicit version the newest one under the tag is used. Tar
/// payloads are extracted under `dest`; a single-file backup is written to
/// `dest/<tag>`.
pub async fn restore_from_provider(
    provider: &dyn StorageProvider,
    username: &str,
    tag: &str,
    version: Option<&str>,
    password: Option<&str>,
    dest: &Path,
) -> Result<RestoreOutcome> {
    let object_key = match version {
        Some(version) => resolve_versioned_key(provider, username, tag, version).await?,
        None => latest_version(provider, username, tag).await?,
    };
    let key = object_key.to_key();

    tracing::debug!(key, "downloading backup");
    let mut reader = provider.download(&key).await?;
    let mut frame = Vec::new();
    reader.read_to_end(&mut frame).await?;

    let payload = match object_key.extension {
        BackupExtension::Tar => frame,
        BackupExtension::Obscure => {
            let password = password.ok_or_else(|| {
                Error::config("a password is required to restore an encrypted backup")
            })?;
            obscure_archive::open(&frame, password)?
        }
    };

    if obscure_archive::looks_like_tar(&payload) {
        let entries = obscure_archive::extract_archive(&payload, dest)?;
        Ok(RestoreOutcome {
            key,
            output_path: dest.to_path_buf(),
            entries_restored: entries,
        })
    } else {
        std::fs::create_dir_all(dest)?;
        let output_path = dest.join(tag);
        std::fs::write(&output_path, &payload)?;
        Ok(RestoreOutcome {
            key,
            output_path,
            entries_restored: 1,
        })
    }
}

/// Delete every stored version under a (user, tag) pair.
///
/// Returns the deleted keys. An unknown tag is `Error::NotFound`; a delete
/// failure partway through leaves the remaining versions in place.
pub async fn delete_tag(
    provider: &dyn StorageProvider,
    username: &str,
    tag: &str,
) -> Result<Vec<String>> {
    let prefix = ObjectKey::prefix_for(username, tag);
    let mut keys = provider.list(&prefix).await?;
    if keys.is_empty() {
        return Err(Error::not_found(prefix));
    }
    keys.sort();

    for key in &keys {
        provider.delete(key).await?;
        tracing::debug!(key = key.as_str(), "deleted");
    }

    Ok(keys)
}

/// Resolve an explicit version to a stored key, trying both extensions.
pub async fn resolve_versioned_key(
    provider: &dyn StorageProvider,
    username: &str,
    tag: &str,
    version: &str,
) -> Result<ObjectKey> {
    for extension in [BackupExtension::Obscure, BackupExtension::Tar] {
        let candidate = ObjectKey::new(username, tag, version, extension);
        if provider.exists(&candidate.to_key()).await? {
            return Ok(candidate);
        }
    }

    Err(Error::not_found(format!(
        "{}/{}/{}/{}",
        obscure_core::BACKUP_PREFIX,
        username,
        tag,
        version
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use obscure_storage::MemoryProvider;
    use tempfile::TempDir;

    /// Fallback double that records the keys it was asked to upload.
    #[derive(Clone, Default)]
    struct RecordingFallback {
        keys: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingFallback {
        fn uploaded_keys(&self) -> Vec<String> {
            self.keys.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FallbackUpload for RecordingFallback {
        async fn upload(&self, key: &str, _data: &[u8], _metadata: &BackupMetadata) -> Result<()> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    fn request(source: &Path, direct: bool) -> BackupRequest {
        BackupRequest {
            source_path: source.to_path_buf(),
            tag: "unit".into(),
            version: "2025.06.01-12.00.00".into(),
            direct,
            provider_key: "memory".into(),
            username: "alice".into(),
        }
    }

    fn populated_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), "bb").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_encrypted_backup_requires_password() {
        let provider = MemoryProvider::new();
        let source = populated_dir();

        let err = backup_to_provider(&provider, None, &request(source.path(), false), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_collision_aborts_before_upload() {
        let provider = MemoryProvider::new();
        let source = populated_dir();
        let req = request(source.path(), true);

        backup_to_provider(&provider, None, &req, None).await.unwrap();
        let err = backup_to_provider(&provider, None, &req, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Collision { .. }));
        assert_eq!(provider.object_count(), 1);
    }

    #[tokio::test]
    async fn test_latest_version_picks_newest() {
        let provider = MemoryProvider::new();
        let source = populated_dir();

        for version in ["2025.01.01-00.00.00", "2025.02.01-00.00.00"] {
            let mut req = request(source.path(), true);
            req.version = version.into();
            backup_to_provider(&provider, None, &req, None).await.unwrap();
        }

        let latest = latest_version(&provider, "alice", "unit").await.unwrap();
        assert_eq!(latest.version, "2025.02.01-00.00.00");
    }

    #[tokio::test]
    async fn test_backup_to_all_reports_partial_failure() {
        let good = MemoryProvider::new();
        let bad = MemoryProvider::new();
        bad.fail_uploads(true);

        let targets: Vec<BackupTarget> = vec![
            ("good".to_string(), Box::new(good.clone()), None),
            ("bad".to_string(), Box::new(bad), None),
        ];

        let source = populated_dir();
        let results = backup_to_all(&targets, &request(source.path(), true), None).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert_eq!(good.object_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_upload_retries_through_fallback() {
        let provider = MemoryProvider::new();
        provider.deny_uploads(true);
        let fallback = RecordingFallback::default();
        let source = populated_dir();

        let outcome = backup_to_provider(
            &provider,
            Some(&fallback),
            &request(source.path(), true),
            None,
        )
        .await
        .unwrap();

        assert!(outcome.used_cli_fallback);
        assert_eq!(fallback.uploaded_keys(), vec![outcome.key]);
    }

    #[tokio::test]
    async fn test_transport_failures_do_not_trigger_fallback() {
        let provider = MemoryProvider::new();
        provider.fail_uploads(true);
        let fallback = RecordingFallback::default();
        let source = populated_dir();

        let err = backup_to_provider(
            &provider,
            Some(&fallback),
            &request(source.path(), true),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert!(fallback.uploaded_keys().is_empty());
    }

    #[tokio::test]
    async fn test_backup_to_all_uses_per_target_fallbacks() {
        let denying = MemoryProvider::new();
        denying.deny_uploads(true);
        let fallback = RecordingFallback::default();

        let targets: Vec<BackupTarget> = vec![(
            "filebase".to_string(),
            Box::new(denying),
            Some(Box::new(fallback.clone())),
        )];

        let source = populated_dir();
        let results = backup_to_all(&targets, &request(source.path(), true), None).await;

        assert!(results[0].1.as_ref().unwrap().used_cli_fallback);
        assert_eq!(fallback.uploaded_keys().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_tag_removes_only_that_tag() {
        let provider = MemoryProvider::new();
        let source = populated_dir();

        for (tag, version) in [
            ("unit", "2025.01.01-00.00.00"),
            ("unit", "2025.02.01-00.00.00"),
            ("other", "2025.01.01-00.00.00"),
        ] {
            let mut req = request(source.path(), true);
            req.tag = tag.into();
            req.version = version.into();
            backup_to_provider(&provider, None, &req, None).await.unwrap();
        }

        let deleted = delete_tag(&provider, "alice", "unit").await.unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(provider.object_count(), 1);
        assert!(provider
            .data_of("backups/alice/other/2025.01.01-00.00.00_other.tar")
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_tag_on_unknown_tag_is_not_found() {
        let provider = MemoryProvider::new();

        let err = delete_tag(&provider, "alice", "missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
