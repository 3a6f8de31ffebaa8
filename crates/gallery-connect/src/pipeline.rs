//! Publishing pipeline orchestration
//!
//! Runs the five publishing steps strictly in order, threading each step's
//! output into the next. The first failure ends the run; nothing is rolled
//! back because the platform offers no way to undo an upload.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::appgallery;
use crate::error::{ConnectError, PipelineError, Result};
use crate::progress::{ProgressSink, TracingSink};
use crate::retry::RetryPolicy;
use crate::transport::{ClientOptions, HttpTransport};
use crate::types::{
    ArtifactProfile, PipelineState, PipelineStep, PublishOutcome, PublishRequest, StepTiming,
};

/// Tuning for a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Retry policy for authenticate, negotiate and attach
    pub retry: RetryPolicy,

    /// File type constants for the artifact
    pub profile: ArtifactProfile,

    /// Overall time limit for the run
    pub deadline: Option<Duration>,
}

/// Single-shot publishing run
pub struct Pipeline {
    request: PublishRequest,
    transport: HttpTransport,
    options: PublishOptions,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

/// State and timings of the run in progress
struct RunState {
    state: PipelineState,
    timings: Vec<StepTiming>,
}

impl Pipeline {
    /// Create a pipeline with a fresh transport for the request's client id
    ///
    /// Fails with `Configuration` when a request field is blank; no step has
    /// run at that point.
    pub fn new(request: PublishRequest, client: &ClientOptions) -> Result<Self> {
        request.validate()?;
        let transport = HttpTransport::new(client, request.client_id())?;
        Self::with_transport(request, transport)
    }

    /// Create a pipeline around an existing transport
    pub fn with_transport(request: PublishRequest, transport: HttpTransport) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            request,
            transport,
            options: PublishOptions::default(),
            sink: Arc::new(TracingSink),
            cancel: CancellationToken::new(),
        })
    }

    /// Set run options
    pub fn with_options(mut self, options: PublishOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the progress sink
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Abort the run when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn request(&self) -> &PublishRequest {
        &self.request
    }

    /// Execute the run to `Submitted` or the first failure
    pub async fn run(self) -> std::result::Result<PublishOutcome, PipelineError> {
        let deadline = self.options.deadline.map(|limit| Instant::now() + limit);
        let mut run = RunState {
            state: PipelineState::Start,
            timings: Vec::with_capacity(PipelineStep::ALL.len()),
        };

        info!(
            app_id = %self.request.application_id(),
            artifact = %self.request.artifact_path().display(),
            "starting publish"
        );

        let request = &self.request;
        let transport = &self.transport;
        let retry = &self.options.retry;
        let profile = &self.options.profile;
        let app_id = request.application_id();

        let token = self
            .step(
                &mut run,
                deadline,
                PipelineStep::Authenticate,
                appgallery::authenticate(
                    transport,
                    request.client_id(),
                    request.client_secret(),
                    retry,
                ),
            )
            .await?;

        let session = self
            .step(
                &mut run,
                deadline,
                PipelineStep::Negotiate,
                appgallery::request_upload_session(
                    transport,
                    &token,
                    app_id,
                    request.file_suffix(),
                    retry,
                ),
            )
            .await?;

        let storage = self
            .step(
                &mut run,
                deadline,
                PipelineStep::Upload,
                appgallery::upload_artifact(
                    transport,
                    session,
                    &token,
                    request.artifact_path(),
                    profile,
                ),
            )
            .await?;

        self.step(
            &mut run,
            deadline,
            PipelineStep::Attach,
            appgallery::attach_file(transport, &token, app_id, &storage, profile, retry),
        )
        .await?;

        self.step(
            &mut run,
            deadline,
            PipelineStep::Submit,
            appgallery::submit(transport, &token, app_id),
        )
        .await?;

        let outcome = PublishOutcome {
            app_id: app_id.to_string(),
            file_dest_url: storage,
            state: run.state,
            steps: run.timings,
            submitted_at: Utc::now(),
        };

        info!(app_id = %outcome.app_id, "publish complete");
        self.sink.finished(&outcome);
        Ok(outcome)
    }

    /// Run one step, racing it against cancellation and the deadline
    async fn step<T, F>(
        &self,
        run: &mut RunState,
        deadline: Option<Instant>,
        step: PipelineStep,
        work: F,
    ) -> std::result::Result<T, PipelineError>
    where
        F: Future<Output = Result<T>>,
    {
        let next = match run.state.advance(step) {
            Some(next) => next,
            None if run.state.is_terminal() => {
                let message = format!("{} cannot run after the run ended ({})", step, run.state);
                return Err(self.fail(run, step, ConnectError::Configuration(message)));
            }
            None => {
                let message = format!("{} cannot run from state {}", step, run.state);
                return Err(self.fail(run, step, ConnectError::Configuration(message)));
            }
        };

        info!(step = %step, "step started");
        self.sink.step_started(step);
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ConnectError::Cancelled),
            _ = wait_until(deadline) => Err(ConnectError::Cancelled),
            result = work => result,
        };

        match result {
            Ok(value) => {
                let elapsed = started.elapsed();
                run.state = next;
                run.timings.push(StepTiming {
                    step,
                    duration_ms: elapsed.as_millis() as u64,
                });
                info!(step = %step, duration_ms = elapsed.as_millis() as u64, "step completed");
                self.sink.step_finished(step, elapsed);
                Ok(value)
            }
            Err(e) => Err(self.fail(run, step, e)),
        }
    }

    fn fail(&self, run: &mut RunState, step: PipelineStep, source: ConnectError) -> PipelineError {
        run.state = run.state.fail(step);
        let err = PipelineError::new(step, source);

        if err.is_cancelled() {
            warn!(step = %step, "publish cancelled");
        } else {
            error!(step = %step, "{}", err);
        }

        self.sink.failed(&err);
        err
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
