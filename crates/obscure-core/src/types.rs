//! Shared types for the backup pipeline

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A fully resolved backup invocation. Immutable once constructed; the CLI
/// or scheduler builds one per run and hands it to the pipeline.
#[derive(Debug, Clone)]
pub struct BackupRequest {
    /// File or directory to back up
    pub source_path: PathBuf,
    /// User-chosen label grouping related versions
    pub tag: String,
    /// Version token, caller-supplied or auto-generated
    pub version: String,
    /// Direct backups skip compression and encryption entirely
    pub direct: bool,
    /// Provider key this backup targets
    pub provider_key: String,
    /// Owner of the backup; first path segment under `backups/`
    pub username: String,
}

/// Metadata attached to the uploaded object on the provider side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub username: String,
    pub tag: String,
    pub version: String,
    pub is_direct: bool,
}

impl BackupMetadata {
    pub fn from_request(request: &BackupRequest) -> Self {
        Self {
            username: request.username.clone(),
            tag: request.tag.clone(),
            version: request.version.clone(),
            is_direct: request.direct,
        }
    }

    /// String map in the shape providers store ("true"/"false" for the flag).
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            ("username".to_string(), self.username.clone()),
            ("tag".to_string(), self.tag.clone()),
            ("version".to_string(), self.version.clone()),
            ("is_direct".to_string(), self.is_direct.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_map_stringifies_direct_flag() {
        let meta = BackupMetadata {
            username: "alice".into(),
            tag: "prod".into(),
            version: "2025.01.01-00.00.00".into(),
            is_direct: true,
        };

        let map = meta.to_map();
        assert_eq!(map["is_direct"], "true");
        assert_eq!(map["username"], "alice");
        assert_eq!(map.len(), 4);
    }
}
