//! Spinner output for operation waits
//!
//! Wraps the core [`ProgressEvent`] stream in an indicatif spinner. A single
//! spinner is shared by every wait in a command, so the clone pipeline shows
//! one line that moves from the snapshot to each clone in turn.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use gcectl_core::{ProgressCallback, ProgressEvent};

/// Spinner that lives as long as the command's waits
pub struct WaitProgress {
    bar: Option<ProgressBar>,
}

impl WaitProgress {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar: Some(pb) }
    }

    /// Callback that updates the spinner, `None` when disabled
    pub fn callback(&self) -> Option<ProgressCallback> {
        let pb = self.bar.clone()?;
        Some(Arc::new(move |event: ProgressEvent| {
            pb.set_message(describe(&event));
        }))
    }

    /// Clear the spinner before printing results
    pub fn finish(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
    }
}

impl Drop for WaitProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

fn describe(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Started { target } => format!("Waiting for {}", target),
        ProgressEvent::Polling { target, state, .. } => {
            format!("{}: {}", target, format_state(state))
        }
        ProgressEvent::Completed { target, elapsed } => format!(
            "{}: {} in {:.1}s",
            target,
            format_state("DONE"),
            elapsed.as_secs_f64()
        ),
        ProgressEvent::Failed { target, error } => format!("{} failed: {}", target, error),
    }
}

/// Format a provider status with an icon
pub fn format_state(state: &str) -> String {
    match state.to_uppercase().as_str() {
        "DONE" | "READY" => format!("\u{2713} {}", state), // checkmark
        "FAILED" => format!("\u{2717} {}", state),         // x mark
        "PENDING" | "RUNNING" | "CREATING" | "UPLOADING" => {
            format!("\u{21bb} {}", state) // arrow circle
        }
        _ => state.to_string(),
    }
}
