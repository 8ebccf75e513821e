//! End-to-end pipeline tests against the in-memory storage backend.

use std::path::Path;

use obscure::pipeline;
use obscure_core::{BackupRequest, Error};
use obscure_storage::MemoryProvider;
use tempfile::TempDir;

fn request(source: &Path, version: &str, direct: bool) -> BackupRequest {
    BackupRequest {
        source_path: source.to_path_buf(),
        tag: "docs".into(),
        version: version.into(),
        direct,
        provider_key: "memory".into(),
        username: "alice".into(),
    }
}

fn sample_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "aa").unwrap();
    std::fs::create_dir(dir.path().join("notes")).unwrap();
    std::fs::write(dir.path().join("notes/b.md"), "# heading\nbody\n").unwrap();
    dir
}

#[tokio::test]
async fn direct_directory_backup_stores_plain_tar() {
    let provider = MemoryProvider::new();
    let source = sample_dir();

    let outcome = pipeline::backup_to_provider(
        &provider,
        None,
        &request(source.path(), "2025.05.01-08.00.00", true),
        None,
    )
    .await
    .unwrap();

    assert_eq!(outcome.key, "backups/alice/docs/2025.05.01-08.00.00_docs.tar");
    assert_eq!(outcome.file_count, 2);
    assert!(!outcome.used_cli_fallback);

    let stored = provider.data_of(&outcome.key).unwrap();
    assert!(obscure_archive::looks_like_tar(&stored));

    let metadata = provider.metadata_of(&outcome.key).unwrap();
    assert_eq!(metadata.username, "alice");
    assert_eq!(metadata.tag, "docs");
    assert!(metadata.is_direct);
}

#[tokio::test]
async fn encrypted_backup_round_trips_through_restore() {
    let provider = MemoryProvider::new();
    let source = sample_dir();

    let outcome = pipeline::backup_to_provider(
        &provider,
        None,
        &request(source.path(), "2025.05.01-08.00.00", false),
        Some("hunter2"),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome.key,
        "backups/alice/docs/2025.05.01-08.00.00_docs.obscure"
    );

    // Stored payload is an opaque frame, not a tar. Its length is exactly
    // the salt/nonce header plus the compressed tar plus the GCM tag.
    let stored = provider.data_of(&outcome.key).unwrap();
    assert!(!obscure_archive::looks_like_tar(&stored));

    let archive = obscure_archive::create_archive(source.path()).unwrap();
    let compressed = obscure_archive::compress(&archive.data, None).unwrap();
    assert_eq!(
        stored.len(),
        obscure_archive::HEADER_LEN + compressed.len() + obscure_archive::TAG_LEN
    );

    let dest = TempDir::new().unwrap();
    let restored = pipeline::restore_from_provider(
        &provider,
        "alice",
        "docs",
        None,
        Some("hunter2"),
        dest.path(),
    )
    .await
    .unwrap();

    assert!(restored.entries_restored >= 2);
    assert_eq!(
        std::fs::read_to_string(dest.path().join("a.txt")).unwrap(),
        "aa"
    );
    assert_eq!(
        std::fs::read_to_string(dest.path().join("notes/b.md")).unwrap(),
        "# heading\nbody\n"
    );
}

#[tokio::test]
async fn restore_with_wrong_password_fails_closed() {
    let provider = MemoryProvider::new();
    let source = sample_dir();

    pipeline::backup_to_provider(
        &provider,
        None,
        &request(source.path(), "2025.05.01-08.00.00", false),
        Some("right"),
    )
    .await
    .unwrap();

    let dest = TempDir::new().unwrap();
    let err = pipeline::restore_from_provider(
        &provider,
        "alice",
        "docs",
        None,
        Some("wrong"),
        dest.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Crypto { .. }));
    assert!(std::fs::read_dir(dest.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn single_file_direct_backup_round_trips_byte_for_byte() {
    let provider = MemoryProvider::new();
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("keys.bin");
    std::fs::write(&file, [0u8, 159, 146, 150]).unwrap();

    let outcome = pipeline::backup_to_provider(
        &provider,
        None,
        &request(&file, "2025.05.01-08.00.00", true),
        None,
    )
    .await
    .unwrap();

    // Raw bytes, no tar wrapper
    assert_eq!(provider.data_of(&outcome.key).unwrap(), vec![0u8, 159, 146, 150]);

    let dest = TempDir::new().unwrap();
    let restored = pipeline::restore_from_provider(&provider, "alice", "docs", None, None, dest.path())
        .await
        .unwrap();

    assert_eq!(restored.entries_restored, 1);
    assert_eq!(
        std::fs::read(&restored.output_path).unwrap(),
        vec![0u8, 159, 146, 150]
    );
}

#[tokio::test]
async fn restore_defaults_to_newest_version() {
    let provider = MemoryProvider::new();

    for (version, content) in [
        ("2025.01.01-00.00.00", "old"),
        ("2025.02.01-00.00.00", "new"),
    ] {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("state.txt"), content).unwrap();
        pipeline::backup_to_provider(&provider, None, &request(dir.path(), version, true), None)
            .await
            .unwrap();
    }

    let dest = TempDir::new().unwrap();
    pipeline::restore_from_provider(&provider, "alice", "docs", None, None, dest.path())
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(dest.path().join("state.txt")).unwrap(),
        "new"
    );
}

#[tokio::test]
async fn explicit_version_restore_finds_either_extension() {
    let provider = MemoryProvider::new();
    let source = sample_dir();

    pipeline::backup_to_provider(
        &provider,
        None,
        &request(source.path(), "2025.03.01-00.00.00", true),
        None,
    )
    .await
    .unwrap();

    let resolved =
        pipeline::resolve_versioned_key(&provider, "alice", "docs", "2025.03.01-00.00.00")
            .await
            .unwrap();
    assert!(resolved.to_key().ends_with(".tar"));

    let err = pipeline::resolve_versioned_key(&provider, "alice", "docs", "1999.01.01-00.00.00")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn collision_preserves_the_existing_object() {
    let provider = MemoryProvider::new();
    let source = sample_dir();
    let req = request(source.path(), "2025.05.01-08.00.00", true);

    pipeline::backup_to_provider(&provider, None, &req, None)
        .await
        .unwrap();
    let original = provider.data_of("backups/alice/docs/2025.05.01-08.00.00_docs.tar");

    let err = pipeline::backup_to_provider(&provider, None, &req, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Collision { .. }));

    assert_eq!(
        provider.data_of("backups/alice/docs/2025.05.01-08.00.00_docs.tar"),
        original
    );
}
