//! Stage progress reporting for the pipeline.
//!
//! `NoopProgress` for tests and headless runs, `IndicatifProgress` for the CLI.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Minimal progress interface used by [`crate::pipeline::Pipeline`].
pub trait Progress: Send + Sync {
    /// Set known total steps (optional).
    fn set_total(&self, _n: u64) {}
    /// Advance by one step and show a short message.
    fn step(&self, _msg: &str) {}
    /// Replace current message without advancing.
    fn message(&self, _msg: &str) {}
    /// Finish the UI.
    fn finish(&self, _msg: &str) {}
}

#[derive(Default, Clone, Copy, Debug)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Indicatif spinner drawn on stderr.
pub struct IndicatifProgress {
    pb: ProgressBar,
}

impl IndicatifProgress {
    /// Spinner with a `[pos/len]` counter once the total is known.
    pub fn spinner() -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
            .map(|s| s.tick_chars("-\\|/ "))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Self { pb }
    }
}

impl Progress for IndicatifProgress {
    fn set_total(&self, n: u64) {
        self.pb.set_length(n);
    }
    fn step(&self, msg: &str) {
        self.pb.inc(1);
        self.pb.set_message(msg.to_string());
    }
    fn message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }
    fn finish(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}

impl Drop for IndicatifProgress {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
