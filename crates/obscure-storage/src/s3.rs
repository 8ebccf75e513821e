//! Generic S3-protocol backend.
//!
//! One implementation serves every backend that speaks the S3 wire protocol:
//! AWS S3 itself plus Backblaze B2, IDrive E2, Storj, Filebase, and arbitrary
//! S3-compatible endpoints. Only the endpoint URL, region, and credentials
//! differ between them.

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region, StalledStreamProtectionConfig};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use obscure_core::{BackupMetadata, Error, ProviderKind, Result};

use crate::traits::{ObjectReader, StorageProvider};

/// Connection settings for one S3-protocol backend.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub kind: ProviderKind,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// None means the native AWS endpoint
    pub endpoint: Option<String>,
}

/// S3-protocol storage backend.
pub struct S3Backend {
    client: aws_sdk_s3::Client,
    bucket: String,
    label: &'static str,
}

impl S3Backend {
    pub fn connect(settings: &S3Settings) -> Self {
        let creds = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "obscure-config",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .region(Region::new(settings.region.clone()))
            .credentials_provider(creds)
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled());

        // Non-AWS endpoints generally require path-style addressing
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
            label: settings.kind.display_name(),
        }
    }

    fn classify<E>(&self, err: E) -> Error
    where
        E: std::error::Error,
    {
        classify_s3_error(self.label, &format!("{}", DisplayErrorContext(err)))
    }
}

/// Map an S3 error string onto the error taxonomy.
///
/// The SDK surfaces service errors by code name inside the rendered message,
/// so substring matching covers every S3-compatible vendor uniformly.
pub fn classify_s3_error(provider: &str, message: &str) -> Error {
    if message.contains("InvalidAccessKeyId")
        || message.contains("SignatureDoesNotMatch")
        || message.contains("AccessDenied")
    {
        return Error::credential_with_hint(
            format!("{} rejected the credentials: {}", provider, message),
            format!("re-run provider setup for {}", provider),
        );
    }

    if message.contains("NoSuchBucket") {
        return Error::transport(
            provider,
            format!("bucket does not exist: {}", message),
            Some("check the bucket name in the provider configuration".to_string()),
        );
    }

    Error::transport(provider, message, None)
}

#[async_trait]
impl StorageProvider for S3Backend {
    fn name(&self) -> &str {
        self.label
    }

    async fn upload(&self, key: &str, data: Vec<u8>, metadata: &BackupMetadata) -> Result<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_metadata(Some(metadata.to_map()))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        tracing::info!(provider = self.label, key, size, "uploaded object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(HeadObjectError::is_not_found)
                {
                    return Ok(false);
                }
                Err(self.classify(err))
            }
        }
    }

    async fn download(&self, key: &str) -> Result<ObjectReader> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    Error::not_found(key)
                } else {
                    self.classify(err)
                }
            })?;

        Ok(Box::new(resp.body.into_async_read()))
    }

    async fn size(&self, key: &str) -> Result<u64> {
        let resp = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(HeadObjectError::is_not_found)
                {
                    Error::not_found(key)
                } else {
                    self.classify(err)
                }
            })?;

        Ok(resp.content_length().unwrap_or(0).max(0) as u64)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.clone())
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            for object in resp.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            match resp.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // DeleteObject succeeds on missing keys, so probe first
        if !self.exists(key).await? {
            return Err(Error::not_found(key));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        tracing::info!(provider = self.label, key, "deleted object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_credential_codes() {
        for code in ["InvalidAccessKeyId", "SignatureDoesNotMatch", "AccessDenied"] {
            let err = classify_s3_error("Storj", &format!("service error: {}", code));
            assert!(err.is_credential(), "{} should classify as credential", code);
            assert!(err.remediation().is_some());
        }
    }

    #[test]
    fn test_classify_missing_bucket() {
        let err = classify_s3_error("AWS S3", "NoSuchBucket: the bucket is gone");
        assert!(matches!(err, Error::Transport { .. }));
        assert!(err.remediation().unwrap().contains("bucket"));
    }

    #[test]
    fn test_classify_other_errors_are_transport_without_hint() {
        let err = classify_s3_error("IDrive E2", "connection reset by peer");
        assert!(matches!(err, Error::Transport { .. }));
        assert!(err.remediation().is_none());
    }
}
