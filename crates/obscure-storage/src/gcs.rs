//! Google Cloud Storage backend.
//!
//! The only backend that does not speak the S3 protocol. Authenticates with
//! a service-account JSON file resolved through a fixed search order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use google_cloud_storage::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use google_cloud_storage::http::objects::upload::{UploadObjectRequest, UploadType};
use google_cloud_storage::http::objects::Object;
use obscure_core::{BackupMetadata, Error, Result};

use crate::traits::{ObjectReader, StorageProvider};

/// Filename searched for in the fallback locations.
pub const SERVICE_ACCOUNT_FILENAME: &str = "gcs-service-account.json";

/// Resolve the service-account file to authenticate with.
///
/// Search order: the configured path, then `~/.obscure/gcs-service-account.json`,
/// then `./gcs-service-account.json`, then `$GOOGLE_APPLICATION_CREDENTIALS`.
pub fn resolve_service_account(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::credential_with_hint(
            format!("configured service account file {} does not exist", path.display()),
            "fix the service_account_path in the provider configuration",
        ));
    }

    if let Some(home) = dirs::home_dir() {
        let candidate = home.join(".obscure").join(SERVICE_ACCOUNT_FILENAME);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let cwd_candidate = PathBuf::from(SERVICE_ACCOUNT_FILENAME);
    if cwd_candidate.exists() {
        return Ok(cwd_candidate);
    }

    if let Ok(env_path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
        let candidate = PathBuf::from(env_path);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(Error::credential_with_hint(
        "no Google Cloud service account file found",
        format!(
            "place {} under ~/.obscure/ or set GOOGLE_APPLICATION_CREDENTIALS",
            SERVICE_ACCOUNT_FILENAME
        ),
    ))
}

/// Google Cloud Storage backend.
pub struct GcsBackend {
    client: Client,
    bucket: String,
}

impl GcsBackend {
    /// Authenticate and connect using a resolved service-account file.
    pub async fn connect(bucket: &str, service_account: &Path) -> Result<Self> {
        let creds = CredentialsFile::new_from_file(
            service_account.to_string_lossy().into_owned(),
        )
        .await
        .map_err(|e| {
            Error::credential_with_hint(
                format!("could not load service account file: {}", e),
                "verify the service account JSON is valid",
            )
        })?;

        let config = ClientConfig::default()
            .with_credentials(creds)
            .await
            .map_err(|e| Error::credential(format!("GCS authentication failed: {}", e)))?;

        Ok(Self {
            client: Client::new(config),
            bucket: bucket.to_string(),
        })
    }

    fn classify(&self, key: &str, err: google_cloud_storage::http::Error) -> Error {
        if is_not_found(&err) {
            return Error::not_found(key);
        }
        Error::transport("Google Cloud Storage", err.to_string(), None)
    }
}

fn is_not_found(err: &google_cloud_storage::http::Error) -> bool {
    matches!(err, google_cloud_storage::http::Error::Response(r) if r.code == 404)
}

#[async_trait]
impl StorageProvider for GcsBackend {
    fn name(&self) -> &str {
        "Google Cloud Storage"
    }

    async fn upload(&self, key: &str, data: Vec<u8>, metadata: &BackupMetadata) -> Result<()> {
        let size = data.len();
        let object = Object {
            name: key.to_string(),
            metadata: Some(metadata.to_map()),
            ..Default::default()
        };

        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    ..Default::default()
                },
                data,
                &UploadType::Multipart(Box::new(object)),
            )
            .await
            .map_err(|e| Error::transport("Google Cloud Storage", e.to_string(), None))?;

        tracing::info!(provider = "gcs", key, size, "uploaded object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .get_object(&GetObjectRequest {
                bucket: self.bucket.clone(),
                object: key.to_string(),
                ..Default::default()
            })
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(self.classify(key, err)),
        }
    }

    async fn download(&self, key: &str) -> Result<ObjectReader> {
        let data = self
            .client
            .download_object(
                &GetObjectRequest {
                    bucket: self.bucket.clone(),
                    object: key.to_string(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| self.classify(key, e))?;

        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn size(&self, key: &str) -> Result<u64> {
        let object = self
            .client
            .get_object(&GetObjectRequest {
                bucket: self.bucket.clone(),
                object: key.to_string(),
                ..Default::default()
            })
            .await
            .map_err(|e| self.classify(key, e))?;

        Ok(object.size.max(0) as u64)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects(&ListObjectsRequest {
                    bucket: self.bucket.clone(),
                    prefix: Some(prefix.to_string()),
                    page_token: page_token.clone(),
                    ..Default::default()
                })
                .await
                .map_err(|e| Error::transport("Google Cloud Storage", e.to_string(), None))?;

            if let Some(items) = resp.items {
                keys.extend(items.into_iter().map(|o| o.name));
            }

            match resp.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object(&DeleteObjectRequest {
                bucket: self.bucket.clone(),
                object: key.to_string(),
                ..Default::default()
            })
            .await
            .map_err(|e| self.classify(key, e))?;

        tracing::info!(provider = "gcs", key, "deleted object");
        Ok(())
    }
}
