//! Application configuration: username, default provider, and the
//! per-provider credential map.
//!
//! The config file is written by an external setup wizard; this module only
//! loads it into an explicit [`AppConfig`] that is passed into components.
//! There is deliberately no global configuration state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default config location under the user's home directory.
pub const CONFIG_DIR: &str = ".obscure";
pub const CONFIG_FILE: &str = "config.json";

/// The seven supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    S3,
    Gcs,
    B2,
    Idrive,
    S3Compatible,
    Storj,
    FilebaseIpfs,
}

impl ProviderKind {
    pub fn all() -> [ProviderKind; 7] {
        [
            Self::S3,
            Self::Gcs,
            Self::B2,
            Self::Idrive,
            Self::S3Compatible,
            Self::Storj,
            Self::FilebaseIpfs,
        ]
    }

    /// Stable key used in config files and CLI flags.
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Gcs => "gcs",
            Self::B2 => "b2",
            Self::Idrive => "idrive",
            Self::S3Compatible => "s3-compatible",
            Self::Storj => "storj",
            Self::FilebaseIpfs => "filebase-ipfs",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|k| k.as_key() == key)
    }

    /// Human-readable backend name for logs and errors.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::S3 => "AWS S3",
            Self::Gcs => "Google Cloud Storage",
            Self::B2 => "Backblaze B2",
            Self::Idrive => "IDrive E2",
            Self::S3Compatible => "S3-compatible",
            Self::Storj => "Storj",
            Self::FilebaseIpfs => "Filebase + IPFS",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Credential shapes, tagged by transport protocol. Six of the seven
/// backends speak the S3 protocol and share one shape; GCS has its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "kebab-case")]
pub enum ProviderCredential {
    S3 {
        bucket: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
        /// None means the native AWS endpoint
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
    Gcs {
        project_id: String,
        bucket: String,
        /// Explicit service-account path; a fallback search order applies
        /// when unset
        #[serde(default, skip_serializing_if = "Option::is_none")]
        service_account_path: Option<PathBuf>,
    },
}

impl ProviderCredential {
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } | Self::Gcs { bucket, .. } => bucket,
        }
    }
}

/// One configured provider entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub kind: ProviderKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub credential: ProviderCredential,
}

fn default_enabled() -> bool {
    true
}

/// Resolved application configuration, constructed once and passed into
/// every component that needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderEntry>,
}

impl AppConfig {
    /// Default config path: `~/.obscure/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::config("could not determine the home directory"))?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the config from an explicit path, or the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::config(format!(
                "could not read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = serde_json::from_str(&contents)?;
        if config.username.is_empty() {
            return Err(Error::config("config file has an empty username"));
        }
        Ok(config)
    }

    /// Look up a configured, enabled provider entry.
    pub fn provider(&self, key: &str) -> Result<&ProviderEntry> {
        let entry = self.providers.get(key).ok_or_else(|| {
            Error::credential_with_hint(
                format!("provider '{}' is not configured", key),
                format!("add a '{}' entry to ~/.obscure/config.json", key),
            )
        })?;

        if !entry.enabled {
            return Err(Error::credential_with_hint(
                format!("provider '{}' is disabled", key),
                format!("set enabled=true for '{}' in ~/.obscure/config.json", key),
            ));
        }

        Ok(entry)
    }

    /// Pick a provider key: explicit flag, then the configured default.
    pub fn resolve_provider_key(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(key) = explicit {
            return Ok(key.to_string());
        }

        self.default_provider.clone().ok_or_else(|| {
            Error::credential_with_hint(
                "no cloud provider is configured",
                "set a default with 'obscure switch-provider <provider>' or pass --provider",
            )
        })
    }

    /// All enabled provider keys, sorted for deterministic iteration.
    pub fn enabled_provider_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .providers
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
