//! Output formatting utilities

use std::time::Duration;

use console::{style, Style};

use gallery_connect::{PipelineError, PipelineStep, ProgressSink, PublishOutcome};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Progress sink that writes pipeline steps to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn line(&self, message: &str) {
        info(message);
    }

    fn step_finished(&self, step: PipelineStep, elapsed: Duration) {
        let timing = style(format!("({} ms)", elapsed.as_millis())).dim();
        success(&format!("{} {}", step.description(), timing));
    }

    fn finished(&self, outcome: &PublishOutcome) {
        success(&format!(
            "Uploaded and submitted app {} for review",
            style(&outcome.app_id).bold()
        ));
    }

    fn failed(&self, err: &PipelineError) {
        error(&format!("Publishing failed: {}", err));
    }
}
