//! In-memory storage backend used by the test suite.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use obscure_core::{BackupMetadata, Error, Result};

use crate::traits::{ObjectReader, StorageProvider};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    metadata: BackupMetadata,
}

/// Map-backed provider with switchable upload failures.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    fail_uploads: Arc<Mutex<bool>>,
    deny_uploads: Arc<Mutex<bool>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail with a transport error.
    pub fn fail_uploads(&self, fail: bool) {
        *self.fail_uploads.lock().unwrap() = fail;
    }

    /// Make every subsequent upload fail with a credential error, the class
    /// that triggers the CLI upload fallback.
    pub fn deny_uploads(&self, deny: bool) {
        *self.deny_uploads.lock().unwrap() = deny;
    }

    /// Metadata stored alongside an object, for assertions.
    pub fn metadata_of(&self, key: &str) -> Option<BackupMetadata> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.metadata.clone())
    }

    /// Raw stored bytes, for assertions.
    pub fn data_of(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|o| o.data.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(&self, key: &str, data: Vec<u8>, metadata: &BackupMetadata) -> Result<()> {
        if *self.fail_uploads.lock().unwrap() {
            return Err(Error::transport("memory", "simulated upload failure", None));
        }
        if *self.deny_uploads.lock().unwrap() {
            return Err(Error::credential("simulated access denial"));
        }

        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn download(&self, key: &str) -> Result<ObjectReader> {
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::not_found(key))?;

        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn size(&self, key: &str) -> Result<u64> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.data.len() as u64)
            .ok_or_else(|| Error::not_found(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.objects.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::not_found(key)),
        }
    }
}
