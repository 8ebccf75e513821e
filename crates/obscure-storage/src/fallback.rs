//! AWS CLI fallback uploader.
//!
//! Filebase occasionally rejects SDK uploads that the AWS CLI accepts for
//! the same credentials. When an SDK upload fails with a credential-class
//! error, the pipeline retries once through `aws s3 cp` before giving up.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use obscure_core::{BackupMetadata, Error, Result};
use tokio::process::Command;

/// Default Filebase S3 endpoint.
pub const FILEBASE_ENDPOINT: &str = "https://s3.filebase.com";

/// Second-chance upload path used when the SDK upload is rejected.
#[async_trait]
pub trait FallbackUpload: Send + Sync {
    async fn upload(&self, key: &str, data: &[u8], metadata: &BackupMetadata) -> Result<()>;
}

/// Uploads objects by shelling out to the AWS CLI.
pub struct CliUploader {
    bucket: String,
    endpoint: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
}

impl CliUploader {
    pub fn new(
        bucket: impl Into<String>,
        endpoint: impl Into<String>,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: endpoint.into(),
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Arguments for `aws`, targeting the same bucket/key/endpoint/region
    /// the SDK upload used. The region goes on the command line so the CLI
    /// works on hosts with no ambient AWS configuration.
    fn command_args(&self, scratch: &Path, key: &str, metadata_arg: &str) -> Vec<String> {
        vec![
            "s3".to_string(),
            "cp".to_string(),
            scratch.display().to_string(),
            format!("s3://{}/{}", self.bucket, key),
            "--endpoint-url".to_string(),
            self.endpoint.clone(),
            "--region".to_string(),
            self.region.clone(),
            "--metadata".to_string(),
            metadata_arg.to_string(),
        ]
    }
}

#[async_trait]
impl FallbackUpload for CliUploader {
    /// Upload a payload with `aws s3 cp`, attaching the backup metadata.
    async fn upload(&self, key: &str, data: &[u8], metadata: &BackupMetadata) -> Result<()> {
        let mut scratch = tempfile::NamedTempFile::new()?;
        scratch.write_all(data)?;
        scratch.flush()?;

        let metadata_arg = metadata
            .to_map()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");

        let output = Command::new("aws")
            .args(self.command_args(scratch.path(), key, &metadata_arg))
            .env("AWS_ACCESS_KEY_ID", &self.access_key_id)
            .env("AWS_SECRET_ACCESS_KEY", &self.secret_access_key)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::credential_with_hint(
                        "the aws CLI is not installed",
                        "install the AWS CLI to enable the Filebase upload fallback",
                    )
                } else {
                    Error::transport("aws-cli", e.to_string(), None)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::transport(
                "aws-cli",
                format!("aws s3 cp failed: {}", stderr.trim()),
                None,
            ));
        }

        tracing::info!(key, bucket = %self.bucket, "uploaded via aws CLI fallback");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_command_targets_bucket_endpoint_and_region() {
        let uploader = CliUploader::new(
            "my-bucket",
            FILEBASE_ENDPOINT,
            "us-east-1",
            "key",
            "secret",
        );

        let args = uploader.command_args(
            &PathBuf::from("/tmp/scratch"),
            "backups/alice/docs/v_docs.obscure",
            "username=alice",
        );

        assert_eq!(args[0], "s3");
        assert_eq!(args[1], "cp");
        assert!(args.contains(&"s3://my-bucket/backups/alice/docs/v_docs.obscure".to_string()));

        let endpoint_at = args.iter().position(|a| a == "--endpoint-url").unwrap();
        assert_eq!(args[endpoint_at + 1], FILEBASE_ENDPOINT);

        let region_at = args.iter().position(|a| a == "--region").unwrap();
        assert_eq!(args[region_at + 1], "us-east-1");
    }

    #[test]
    fn test_metadata_arg_shape() {
        let metadata = BackupMetadata {
            username: "alice".into(),
            tag: "docs".into(),
            version: "2025.01.01-00.00.00".into(),
            is_direct: false,
        };

        let mut pairs: Vec<String> = metadata
            .to_map()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        pairs.sort();

        assert!(pairs.contains(&"username=alice".to_string()));
        assert!(pairs.contains(&"is_direct=false".to_string()));
        assert_eq!(pairs.len(), 4);
    }
}
