//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Obscure - encrypted personal backups across cloud providers
#[derive(Parser, Debug)]
#[command(name = "obscure")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the config file (default: ~/.obscure/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Back up a file or directory
    Backup(BackupArgs),

    /// Restore a backup
    Restore(RestoreArgs),

    /// List stored backups
    Ls(LsArgs),

    /// Delete a stored backup version
    Rm(RmArgs),

    /// Delete every stored version under a tag
    Rmdir(RmdirArgs),

    /// Set the default provider
    SwitchProvider(SwitchProviderArgs),

    /// Run recurring backups on a schedule
    Scheduler(SchedulerArgs),
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// File or directory to back up
    pub path: PathBuf,

    /// Label grouping related backup versions
    #[arg(short, long)]
    pub tag: String,

    /// Version token (default: current timestamp)
    #[arg(long)]
    pub version: Option<String>,

    /// Skip compression and encryption
    #[arg(short, long)]
    pub direct: bool,

    /// Provider to upload to (default: the configured default)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Upload to every enabled provider
    #[arg(long, conflicts_with = "provider")]
    pub all_providers: bool,

    /// Versions to keep under this tag after uploading
    #[arg(short, long)]
    pub retain: Option<usize>,

    /// Encryption password (prompted when omitted)
    #[arg(long, env = "OBSCURE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Tag to restore
    #[arg(short, long)]
    pub tag: String,

    /// Version to restore (default: the newest)
    #[arg(long)]
    pub version: Option<String>,

    /// Provider to download from
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Directory to restore into
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Decryption password (prompted when needed)
    #[arg(long, env = "OBSCURE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Provider to list from
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Only show versions under this tag
    #[arg(short, long)]
    pub tag: Option<String>,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Tag of the backup to delete
    #[arg(short, long)]
    pub tag: String,

    /// Version to delete
    #[arg(long)]
    pub version: String,

    /// Provider to delete from
    #[arg(short, long)]
    pub provider: Option<String>,
}

#[derive(Args, Debug)]
pub struct RmdirArgs {
    /// Tag whose versions are all deleted
    #[arg(short, long)]
    pub tag: String,

    /// Provider to delete from
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct SwitchProviderArgs {
    /// Provider key to make the default
    pub provider: String,
}

#[derive(Args, Debug)]
pub struct SchedulerArgs {
    /// File or directory to back up on each run
    pub path: PathBuf,

    /// Label grouping the scheduled versions
    #[arg(short, long)]
    pub tag: String,

    /// Provider to upload to (default: the configured default)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Skip compression and encryption
    #[arg(short, long)]
    pub direct: bool,

    /// Versions to keep under this tag after each run (default: 5)
    #[arg(short, long)]
    pub retain: Option<usize>,

    /// Run daily at this local time (HH:MM)
    #[arg(long, group = "cadence")]
    pub time: Option<String>,

    /// Run every N minutes
    #[arg(long, group = "cadence")]
    pub every: Option<u32>,

    /// Run on a raw cron expression
    #[arg(long, group = "cadence")]
    pub cron: Option<String>,

    /// How scheduled runs assign versions (only 'auto' is supported)
    #[arg(long, value_enum, default_value = "auto")]
    pub version_policy: obscure::VersionPolicy,

    /// File holding the encryption passphrase (default: the
    /// OBSCURE_SCHEDULER_PASSPHRASE environment variable)
    #[arg(long)]
    pub passphrase_file: Option<PathBuf>,
}
