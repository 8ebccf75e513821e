//! Recurring backup scheduling.
//!
//! Schedules are expressed three ways: a daily HH:MM time, an every-N-minutes
//! interval, or a raw cron expression. All of them normalize to a six-field
//! cron expression (with seconds) before validation.
//!
//! The encryption passphrase for scheduled runs comes from the environment
//! or a file; it is never baked into the binary and never passed as a
//! command-line argument.

use std::path::Path;
use std::str::FromStr;

use chrono::Local;
use cron::Schedule;
use obscure_core::{Error, Result};

/// Environment variable holding the scheduler passphrase.
pub const PASSPHRASE_ENV: &str = "OBSCURE_SCHEDULER_PASSPHRASE";

/// How often scheduled backups run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleSpec {
    /// Once a day at the given local time
    Daily { hour: u8, minute: u8 },
    /// Every N minutes
    EveryMinutes(u32),
    /// Raw cron expression (5 fields, or 6/7 with seconds)
    Cron(String),
}

impl ScheduleSpec {
    /// Parse a `HH:MM` daily time.
    pub fn daily_from_str(time: &str) -> Result<Self> {
        let (hour, minute) = time
            .split_once(':')
            .ok_or_else(|| Error::config(format!("invalid time '{}', expected HH:MM", time)))?;

        let hour: u8 = hour
            .parse()
            .map_err(|_| Error::config(format!("invalid hour in '{}'", time)))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| Error::config(format!("invalid minute in '{}'", time)))?;

        if hour > 23 || minute > 59 {
            return Err(Error::config(format!("time '{}' is out of range", time)));
        }

        Ok(Self::Daily { hour, minute })
    }

    /// Normalize to a six-field cron expression with a seconds column.
    pub fn cron_expression(&self) -> Result<String> {
        match self {
            Self::Daily { hour, minute } => Ok(format!("0 {} {} * * *", minute, hour)),
            Self::EveryMinutes(n) => {
                if !(1..=59).contains(n) {
                    return Err(Error::config(format!(
                        "interval must be between 1 and 59 minutes, got {}",
                        n
                    )));
                }
                Ok(format!("0 */{} * * * *", n))
            }
            Self::Cron(raw) => {
                let fields = raw.split_whitespace().count();
                match fields {
                    5 => Ok(format!("0 {}", raw.trim())),
                    6 | 7 => Ok(raw.trim().to_string()),
                    _ => Err(Error::config(format!(
                        "cron expression '{}' has {} fields, expected 5, 6, or 7",
                        raw, fields
                    ))),
                }
            }
        }
    }

    /// Validate and compile the schedule.
    pub fn compile(&self) -> Result<Schedule> {
        let expression = self.cron_expression()?;
        Schedule::from_str(&expression)
            .map_err(|e| Error::config(format!("invalid schedule '{}': {}", expression, e)))
    }
}

/// How scheduled runs assign backup versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VersionPolicy {
    /// A fresh timestamp version for every run
    Auto,
    /// One version reused across runs (not supported, see below)
    Fixed,
}

impl VersionPolicy {
    /// Stored objects are write-once, so a fixed version collides on the
    /// second run. The variant exists so the flag rejects it with an
    /// explanation instead of an unknown-value parse error.
    pub fn ensure_supported(self) -> Result<()> {
        match self {
            Self::Auto => Ok(()),
            Self::Fixed => Err(Error::config(
                "version policy 'fixed' is not supported: backups are \
                 write-once, so a fixed version would collide on the second \
                 scheduled run; use 'auto'",
            )),
        }
    }
}

/// Resolve the passphrase for scheduled encrypted backups.
///
/// An explicit file wins; otherwise the environment variable is consulted.
pub fn resolve_passphrase(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "could not read passphrase file {}: {}",
                path.display(),
                e
            ))
        })?;

        let passphrase = contents.trim();
        if passphrase.is_empty() {
            return Err(Error::config(format!(
                "passphrase file {} is empty",
                path.display()
            )));
        }
        return Ok(passphrase.to_string());
    }

    match std::env::var(PASSPHRASE_ENV) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::credential_with_hint(
            "no scheduler passphrase configured",
            format!("set {} or pass --passphrase-file", PASSPHRASE_ENV),
        )),
    }
}

/// Drives a job on a compiled schedule until the process is stopped.
pub struct Scheduler {
    schedule: Schedule,
}

impl Scheduler {
    pub fn new(spec: &ScheduleSpec) -> Result<Self> {
        Ok(Self {
            schedule: spec.compile()?,
        })
    }

    /// Run `job` at every scheduled instant. Job failures are logged and the
    /// loop keeps going; only a schedule with no future instants stops it.
    pub async fn run<F, Fut>(&self, mut job: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        loop {
            let next = self
                .schedule
                .upcoming(Local)
                .next()
                .ok_or_else(|| Error::config("schedule has no future run times"))?;

            let wait = (next - Local::now()).to_std().unwrap_or_default();
            tracing::info!(next = %next, "waiting for next scheduled backup");
            tokio::time::sleep(wait).await;

            if let Err(err) = job().await {
                tracing::error!(error = %err, "scheduled backup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_parses_and_normalizes() {
        let spec = ScheduleSpec::daily_from_str("03:30").unwrap();
        assert_eq!(spec, ScheduleSpec::Daily { hour: 3, minute: 30 });
        assert_eq!(spec.cron_expression().unwrap(), "0 30 3 * * *");
        spec.compile().unwrap();
    }

    #[test]
    fn test_daily_rejects_bad_times() {
        assert!(ScheduleSpec::daily_from_str("24:00").is_err());
        assert!(ScheduleSpec::daily_from_str("12:60").is_err());
        assert!(ScheduleSpec::daily_from_str("noon").is_err());
        assert!(ScheduleSpec::daily_from_str("12").is_err());
    }

    #[test]
    fn test_interval_normalizes() {
        let spec = ScheduleSpec::EveryMinutes(15);
        assert_eq!(spec.cron_expression().unwrap(), "0 */15 * * * *");
        spec.compile().unwrap();

        assert!(ScheduleSpec::EveryMinutes(0).cron_expression().is_err());
        assert!(ScheduleSpec::EveryMinutes(60).cron_expression().is_err());
    }

    #[test]
    fn test_raw_cron_gains_seconds_field() {
        let spec = ScheduleSpec::Cron("30 2 * * 1".to_string());
        assert_eq!(spec.cron_expression().unwrap(), "0 30 2 * * 1");
        spec.compile().unwrap();

        let spec = ScheduleSpec::Cron("0 30 2 * * 1".to_string());
        assert_eq!(spec.cron_expression().unwrap(), "0 30 2 * * 1");

        assert!(ScheduleSpec::Cron("* *".to_string()).cron_expression().is_err());
        assert!(ScheduleSpec::Cron("not a cron line at all eh eh".to_string())
            .cron_expression()
            .is_err());
    }

    #[test]
    fn test_compile_rejects_nonsense_fields() {
        assert!(ScheduleSpec::Cron("99 99 * * *".to_string()).compile().is_err());
    }

    #[test]
    fn test_fixed_version_policy_is_rejected_with_an_explanation() {
        assert!(VersionPolicy::Auto.ensure_supported().is_ok());

        let err = VersionPolicy::Fixed.ensure_supported().unwrap_err();
        assert!(err.to_string().contains("write-once"));
    }

    #[test]
    fn test_passphrase_file_wins_and_is_trimmed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("passphrase");
        std::fs::write(&path, "s3cret\n").unwrap();

        assert_eq!(resolve_passphrase(Some(&path)).unwrap(), "s3cret");
    }

    #[test]
    fn test_empty_passphrase_file_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("passphrase");
        std::fs::write(&path, "  \n").unwrap();

        assert!(resolve_passphrase(Some(&path)).is_err());
    }
}
