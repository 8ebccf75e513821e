//! # obscure-core
//!
//! Core library for the Obscure CLI providing:
//! - Configuration file parsing (~/.obscure/config.json)
//! - The canonical object-key scheme for stored backups
//! - Shared types for backup requests and object metadata
//! - The error taxonomy used across every crate

pub mod config;
pub mod error;
pub mod keys;
pub mod types;

pub use config::{AppConfig, ProviderCredential, ProviderEntry, ProviderKind};
pub use error::{Error, Result};
pub use keys::{auto_version, group_by_tag, BackupExtension, ObjectKey, BACKUP_PREFIX};
pub use types::{BackupMetadata, BackupRequest};
