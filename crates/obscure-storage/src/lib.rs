//! Storage backends for Obscure backups
//!
//! This crate provides the storage abstraction layer for the seven
//! supported backends:
//!
//! - AWS S3
//! - Backblaze B2
//! - IDrive E2
//! - Storj
//! - Filebase + IPFS
//! - Arbitrary S3-compatible endpoints
//! - Google Cloud Storage
//!
//! Every S3-protocol backend shares one implementation; only endpoint,
//! region, and credentials differ. GCS has its own client.

pub mod fallback;
pub mod gcs;
pub mod memory;
pub mod retention;
pub mod s3;
pub mod traits;

pub use fallback::{CliUploader, FallbackUpload, FILEBASE_ENDPOINT};
pub use memory::MemoryProvider;
pub use retention::{enforce, RetentionReport, DEFAULT_RETAIN};
pub use traits::{ObjectReader, StorageProvider};

use obscure_core::{Error, ProviderCredential, ProviderEntry, ProviderKind, Result};

/// Create a storage backend from a configured provider entry.
pub async fn create_provider(entry: &ProviderEntry) -> Result<Box<dyn StorageProvider>> {
    match (&entry.kind, &entry.credential) {
        (ProviderKind::Gcs, ProviderCredential::Gcs { bucket, service_account_path, .. }) => {
            let sa = gcs::resolve_service_account(service_account_path.as_deref())?;
            Ok(Box::new(gcs::GcsBackend::connect(bucket, &sa).await?))
        }
        (ProviderKind::Gcs, _) => Err(Error::config(
            "the gcs provider requires a gcs credential block",
        )),
        (kind, ProviderCredential::S3 { bucket, region, access_key_id, secret_access_key, endpoint }) => {
            let endpoint = match (kind, endpoint) {
                (_, Some(url)) => Some(url.clone()),
                // Filebase has a fixed endpoint; native AWS needs none
                (ProviderKind::FilebaseIpfs, None) => Some(FILEBASE_ENDPOINT.to_string()),
                (ProviderKind::S3, None) => None,
                (other, None) => {
                    return Err(Error::config(format!(
                        "provider kind '{}' requires an endpoint URL",
                        other
                    )));
                }
            };

            Ok(Box::new(s3::S3Backend::connect(&s3::S3Settings {
                kind: *kind,
                bucket: bucket.clone(),
                region: region.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                endpoint,
            })))
        }
        (kind, ProviderCredential::Gcs { .. }) => Err(Error::config(format!(
            "provider kind '{}' requires an s3 credential block",
            kind
        ))),
    }
}
