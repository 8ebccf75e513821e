//! Canonical object-key scheme for stored backups.
//!
//! Every backup lives at `backups/<username>/<tag>/<version>_<tag>.<ext>`
//! where the extension is `tar` for direct (unencrypted) backups and
//! `obscure` for the encrypted ones. Auto-generated versions are zero-padded
//! timestamps, so plain string ordering on the version token is
//! chronological.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};

/// Root prefix all backup objects live under.
pub const BACKUP_PREFIX: &str = "backups";

/// Format string for auto-generated versions. Fixed-width and zero-padded so
/// lexical order matches chronological order.
pub const VERSION_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

/// Object extension, determined by whether the backup is direct or encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupExtension {
    /// Plain tar archive (direct backup)
    Tar,
    /// Encrypted frame (compressed tar sealed with AES-256-GCM)
    Obscure,
}

impl BackupExtension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::Obscure => "obscure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tar" => Some(Self::Tar),
            "obscure" => Some(Self::Obscure),
            _ => None,
        }
    }

    /// Extension for a backup given its direct flag.
    pub fn for_direct(direct: bool) -> Self {
        if direct {
            Self::Tar
        } else {
            Self::Obscure
        }
    }
}

impl fmt::Display for BackupExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical identity of a stored backup object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub username: String,
    pub tag: String,
    pub version: String,
    pub extension: BackupExtension,
}

impl ObjectKey {
    pub fn new(
        username: impl Into<String>,
        tag: impl Into<String>,
        version: impl Into<String>,
        extension: BackupExtension,
    ) -> Self {
        Self {
            username: username.into(),
            tag: tag.into(),
            version: version.into(),
            extension,
        }
    }

    /// Serialize to the canonical storage key.
    pub fn to_key(&self) -> String {
        format!(
            "{}/{}/{}/{}_{}.{}",
            BACKUP_PREFIX, self.username, self.tag, self.version, self.tag, self.extension
        )
    }

    /// Parse a storage key back into its logical parts.
    ///
    /// Returns `None` for keys that do not follow the canonical layout;
    /// listings skip those instead of failing.
    pub fn parse(key: &str) -> Option<Self> {
        let parts: Vec<&str> = key.split('/').collect();
        if parts.len() < 4 {
            return None;
        }

        let username = parts[parts.len() - 3];
        let tag = parts[parts.len() - 2];
        let filename = parts[parts.len() - 1];

        let dot = filename.rfind('.')?;
        let (stem, ext) = filename.split_at(dot);
        let extension = BackupExtension::parse(&ext[1..])?;

        let version = stem.split('_').next()?;
        if version.is_empty() || tag.is_empty() || username.is_empty() {
            return None;
        }

        Some(Self::new(username, tag, version, extension))
    }

    /// Listing prefix for every version under a (user, tag) pair.
    pub fn prefix_for(username: &str, tag: &str) -> String {
        format!("{}/{}/{}/", BACKUP_PREFIX, username, tag)
    }

    /// Listing prefix for every backup a user owns.
    pub fn user_prefix(username: &str) -> String {
        format!("{}/{}/", BACKUP_PREFIX, username)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key())
    }
}

/// Generate an auto version token for the given instant.
pub fn auto_version(now: DateTime<Local>) -> String {
    now.format(VERSION_FORMAT).to_string()
}

/// Group raw listing keys by tag, newest version first within each tag.
///
/// Keys that do not parse as canonical backup keys are skipped.
pub fn group_by_tag(keys: &[String]) -> BTreeMap<String, Vec<ObjectKey>> {
    let mut grouped: BTreeMap<String, Vec<ObjectKey>> = BTreeMap::new();

    for key in keys {
        if let Some(parsed) = ObjectKey::parse(key) {
            grouped.entry(parsed.tag.clone()).or_default().push(parsed);
        }
    }

    for versions in grouped.values_mut() {
        versions.sort_by(|a, b| b.version.cmp(&a.version));
    }

    grouped
}
