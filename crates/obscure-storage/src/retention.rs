//! Version retention for a (user, tag) pair.
//!
//! Auto-generated versions are fixed-width timestamps, so plain string
//! ordering on the object keys is chronological. Enforcement keeps the
//! newest `retain` versions and deletes the rest, skipping over individual
//! delete failures so one bad object cannot wedge the whole sweep.

use obscure_core::{ObjectKey, Result};

use crate::traits::StorageProvider;

/// Default number of versions kept per tag.
pub const DEFAULT_RETAIN: usize = 5;

/// Outcome of a retention sweep.
#[derive(Debug, Default)]
pub struct RetentionReport {
    /// Versions found under the tag prefix
    pub examined: usize,
    /// Keys successfully deleted
    pub deleted: Vec<String>,
    /// Keys that failed to delete, with the error text
    pub failed: Vec<(String, String)>,
}

impl RetentionReport {
    pub fn removed_anything(&self) -> bool {
        !self.deleted.is_empty()
    }
}

/// Keep the newest `retain` versions under a (user, tag) pair.
pub async fn enforce(
    provider: &dyn StorageProvider,
    username: &str,
    tag: &str,
    retain: usize,
) -> Result<RetentionReport> {
    let prefix = ObjectKey::prefix_for(username, tag);
    let mut keys = provider.list(&prefix).await?;
    keys.sort();

    let mut report = RetentionReport {
        examined: keys.len(),
        ..Default::default()
    };

    if keys.len() <= retain {
        return Ok(report);
    }

    let excess = keys.len() - retain;
    for key in &keys[..excess] {
        match provider.delete(key).await {
            Ok(()) => {
                tracing::info!(key, tag, "pruned old backup version");
                report.deleted.push(key.clone());
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to prune backup version");
                report.failed.push((key.clone(), err.to_string()));
            }
        }
    }

    Ok(report)
}
