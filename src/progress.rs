//! Progress reporting
//!
//! The pipeline reports progress through the [`ProgressReporter`] trait so
//! the library stays usable without a terminal. [`CliProgress`] renders
//! indicatif bars; [`NoopProgress`] discards everything.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Receiver for progress of downloads and shard processing
///
/// Implementations must be cheap to call: `update` runs once per network
/// chunk and once per decompressed block.
pub trait ProgressReporter: Send + Sync {
    /// Begin a new operation with an optional known total
    fn start(&self, message: &str, total: Option<u64>);

    /// Report the current position
    fn update(&self, current: u64, total: Option<u64>);

    /// Replace the message of the current operation
    fn message(&self, msg: &str);

    /// Finish the current operation successfully
    fn finish(&self, message: &str);

    /// Finish the current operation with an error
    fn finish_with_error(&self, message: &str);
}

/// Progress reporter that ignores every call
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _message: &str, _total: Option<u64>) {}
    fn update(&self, _current: u64, _total: Option<u64>) {}
    fn message(&self, _msg: &str) {}
    fn finish(&self, _message: &str) {}
    fn finish_with_error(&self, _message: &str) {}
}

/// Terminal progress bars
///
/// A byte bar when the total is known (shard downloads with a usable HEAD
/// response), a spinner otherwise.
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Create a new CLI progress reporter
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn create_download_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{msg}: [{bar:40.cyan/blue}] {percent:>3}% {bytes}/{total_bytes} {bytes_per_sec} ETA:{eta}",
        ) {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg}: {bytes} {bytes_per_sec}")
        {
            pb.set_style(style);
        }
        pb
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut guard| guard.take())
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliProgress {
    fn start(&self, message: &str, total: Option<u64>) {
        let pb = match total {
            Some(t) if t > 0 => Self::create_download_bar(t),
            _ => Self::create_spinner(),
        };
        pb.set_message(message.to_string());

        if let Ok(mut guard) = self.bar.lock()
            && let Some(previous) = guard.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn update(&self, current: u64, total: Option<u64>) {
        self.with_bar(|pb| {
            if let Some(t) = total {
                pb.set_length(t);
            }
            pb.set_position(current);
        });
    }

    fn message(&self, msg: &str) {
        self.with_bar(|pb| pb.set_message(msg.to_string()));
    }

    fn finish(&self, message: &str) {
        if let Some(pb) = self.take_bar() {
            pb.finish_with_message(message.to_string());
        }
    }

    fn finish_with_error(&self, message: &str) {
        if let Some(pb) = self.take_bar() {
            pb.abandon_with_message(message.to_string());
        }
    }
}
