//! Storage provider trait definitions

use async_trait::async_trait;
use obscure_core::{BackupMetadata, Result};
use tokio::io::AsyncRead;

/// Readable stream handed back by [`StorageProvider::download`].
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// A storage backend holding backup objects.
///
/// Backups are write-once: callers check [`exists`](Self::exists) before
/// [`upload`](Self::upload), and implementations never overwrite silently.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Human-readable backend name for logs and errors
    fn name(&self) -> &str;

    /// Upload an object with its metadata
    async fn upload(&self, key: &str, data: Vec<u8>, metadata: &BackupMetadata) -> Result<()>;

    /// Whether an object exists at the given key
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Open an object for reading. Fails with `NotFound` for missing keys.
    async fn download(&self, key: &str) -> Result<ObjectReader>;

    /// Size in bytes of a stored object
    async fn size(&self, key: &str) -> Result<u64>;

    /// All object keys under a prefix
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete an object. Fails with `NotFound` for missing keys.
    async fn delete(&self, key: &str) -> Result<()>;
}
