//! Progress reporting for pipeline runs

use std::time::Duration;

use tracing::info;

use crate::error::PipelineError;
use crate::types::{PipelineStep, PublishOutcome};

/// Receives human-readable progress lines from a pipeline run
///
/// Only [`ProgressSink::line`] is required; the step hooks format a default
/// message and forward it.
pub trait ProgressSink: Send + Sync {
    /// Write one progress line
    fn line(&self, message: &str);

    /// A step is about to run
    fn step_started(&self, step: PipelineStep) {
        self.line(&format!("{}...", step.description()));
    }

    /// A step completed
    fn step_finished(&self, step: PipelineStep, elapsed: Duration) {
        self.line(&format!("{} done ({} ms)", step, elapsed.as_millis()));
    }

    /// The run reached `Submitted`
    fn finished(&self, outcome: &PublishOutcome) {
        self.line(&format!(
            "Uploaded and submitted app {} for review",
            outcome.app_id
        ));
    }

    /// The run failed
    fn failed(&self, error: &PipelineError) {
        self.line(&format!("Publishing failed: {}", error));
    }
}

/// Forwards progress lines to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn line(&self, message: &str) {
        info!("{}", message);
    }
}

/// Discards progress lines
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn line(&self, _message: &str) {}
}
