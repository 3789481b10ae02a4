//! CLI presenter for output formatting

use colored::*;

use crate::application::{SessionReport, UploadOutcome};

/// Presenter for CLI output formatting
#[derive(Debug, Default)]
pub struct Presenter;

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print node status line
    pub fn node_status(&self, state: &str) {
        eprintln!("{} Node: {}", "●".cyan(), state);
    }

    /// Print the summary of a finished session
    pub fn session_report(&self, report: &SessionReport) {
        let summary = format_session_summary(report);
        match &report.outcome {
            Some(UploadOutcome::Success { .. }) => self.success(&summary),
            Some(UploadOutcome::Failed { .. }) => self.error(&summary),
            None => self.warn(&summary),
        }
    }
}

/// One-line description of a session and its upload
pub fn format_session_summary(report: &SessionReport) -> String {
    let metrics = &report.metrics;
    let level = metrics
        .avg_db()
        .map(|db| format!("{:.1} dB avg", db))
        .unwrap_or_else(|| "no level".to_string());
    let upload = match &report.outcome {
        Some(outcome) => outcome.to_string(),
        None => "not uploaded (empty)".to_string(),
    };

    format!(
        "Session {:.1}s ({}), {}, {} clipped, {} silent, {} errors: {}",
        report.duration_secs,
        report.reason,
        level,
        metrics.clip_count(),
        metrics.silence_count(),
        metrics.error_count(),
        upload
    )
}
