//! Progress reporting for backup and restore operations.
//!
//! Provides visual feedback during the archive, seal, and transfer phases.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Progress reporter for the backup pipeline.
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    multi: Arc<MultiProgress>,
    phase_bar: Option<ProgressBar>,
    transfer_bar: Option<ProgressBar>,
}

impl PipelineProgress {
    pub fn new() -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            phase_bar: None,
            transfer_bar: None,
        }
    }

    /// Starts a spinner for an unsized phase (archiving, sealing).
    pub fn start_phase(&mut self, message: &str) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        self.phase_bar = Some(bar);
    }

    /// Finishes the current phase spinner.
    pub fn finish_phase(&self, message: &str) {
        if let Some(bar) = &self.phase_bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Starts the transfer phase with a known byte count.
    pub fn start_transfer(&mut self, total_bytes: u64, message: &str) {
        let bar = self.multi.add(ProgressBar::new(total_bytes));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)")
                .unwrap()
                .progress_chars("#>-"),
        );
        bar.set_message(message.to_string());
        self.transfer_bar = Some(bar);
    }

    /// Advances the transfer progress by a number of bytes.
    pub fn inc_transfer(&self, bytes: u64) {
        if let Some(bar) = &self.transfer_bar {
            bar.inc(bytes);
        }
    }

    /// Finishes the transfer phase.
    pub fn finish_transfer(&self, message: &str) {
        if let Some(bar) = &self.transfer_bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Finishes and clears every bar.
    pub fn finish_all(&self) {
        if let Some(bar) = &self.phase_bar {
            bar.finish_and_clear();
        }
        if let Some(bar) = &self.transfer_bar {
            bar.finish_and_clear();
        }
    }
}

impl Default for PipelineProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_creation() {
        let progress = PipelineProgress::new();
        assert!(progress.phase_bar.is_none());
        assert!(progress.transfer_bar.is_none());
    }

    #[test]
    fn test_progress_lifecycle() {
        let mut progress = PipelineProgress::new();

        progress.start_phase("Archiving...");
        assert!(progress.phase_bar.is_some());
        progress.finish_phase("Archive ready");

        progress.start_transfer(1024, "Uploading...");
        assert!(progress.transfer_bar.is_some());
        progress.inc_transfer(512);
        progress.inc_transfer(512);
        progress.finish_transfer("Upload complete");

        progress.finish_all();
    }
}
