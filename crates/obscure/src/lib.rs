//! # obscure
//!
//! Orchestration layer for the Obscure CLI: the backup/restore pipeline and
//! the recurring-backup scheduler. The binary in this crate wires these to
//! the command-line surface.

pub mod pipeline;
pub mod scheduler;

pub use pipeline::{
    backup_to_all, backup_to_provider, delete_tag, latest_version, restore_from_provider,
    BackupOutcome, BackupTarget, RestoreOutcome,
};
pub use scheduler::{
    resolve_passphrase, ScheduleSpec, Scheduler, VersionPolicy, PASSPHRASE_ENV,
};
