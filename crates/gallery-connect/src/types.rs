//! Domain types threaded through the publishing pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ConnectError, Result};

/// Inputs of one publishing run
///
/// Owned by the pipeline for the duration of a run and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishRequest {
    artifact_path: PathBuf,
    client_id: String,
    client_secret: String,
    application_id: String,
    file_suffix: String,
}

impl PublishRequest {
    /// Create a new publish request
    pub fn new(
        artifact_path: impl Into<PathBuf>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        application_id: impl Into<String>,
        file_suffix: impl Into<String>,
    ) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            application_id: application_id.into(),
            file_suffix: file_suffix.into(),
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn file_suffix(&self) -> &str {
        &self.file_suffix
    }

    /// Check that every field is present
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("app_id", self.application_id.as_str()),
            ("suffix", self.file_suffix.as_str()),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConnectError::Configuration(format!("{} is empty", name)));
            }
        }

        if self.artifact_path.as_os_str().is_empty() {
            return Err(ConnectError::Configuration("artifact path is empty".to_string()));
        }

        Ok(())
    }
}

impl fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishRequest")
            .field("artifact_path", &self.artifact_path)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("file_suffix", &self.file_suffix)
            .finish()
    }
}

/// Short-lived bearer credential
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// One-time upload destination
///
/// Consumed by value on upload so a session can only be used once.
#[derive(Debug, PartialEq, Eq)]
pub struct UploadSession {
    /// Absolute URL the artifact is posted to
    pub upload_url: String,

    /// Per-upload credential sent as a form field
    pub auth_code: String,
}

/// Location of an uploaded artifact on the platform's storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageReference(String);

impl StorageReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File entry registered against an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileManifestEntry {
    pub file_name: String,
    pub file_dest_url: String,
}

/// Body of the app file info update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfoUpdate {
    pub file_type: String,
    pub files: FileManifestEntry,
}

/// Protocol constants for a class of artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactProfile {
    /// File type code expected by the file info endpoint
    pub file_type: String,

    /// File name the artifact is registered under
    pub file_name: String,

    /// MIME type of the uploaded file part
    pub mime_type: String,
}

impl ArtifactProfile {
    /// Android application package
    pub fn android_package() -> Self {
        Self {
            file_type: "5".to_string(),
            file_name: "app.apk".to_string(),
            mime_type: "application/vnd.android.package-archive".to_string(),
        }
    }

    /// Manifest entry for a stored artifact under this profile
    pub fn manifest_update(&self, storage: &StorageReference) -> FileInfoUpdate {
        FileInfoUpdate {
            file_type: self.file_type.clone(),
            files: FileManifestEntry {
                file_name: self.file_name.clone(),
                file_dest_url: storage.as_str().to_string(),
            },
        }
    }
}

impl Default for ArtifactProfile {
    fn default() -> Self {
        Self::android_package()
    }
}

/// Steps of a publishing run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Exchange client credentials for a token
    Authenticate,
    /// Obtain an upload URL and auth code
    Negotiate,
    /// Transfer the artifact
    Upload,
    /// Register the uploaded file against the app
    Attach,
    /// Submit the app for review
    Submit,
}

impl PipelineStep {
    /// All steps in execution order
    pub const ALL: [PipelineStep; 5] = [
        PipelineStep::Authenticate,
        PipelineStep::Negotiate,
        PipelineStep::Upload,
        PipelineStep::Attach,
        PipelineStep::Submit,
    ];

    /// State reached once this step has succeeded
    pub fn completed_state(self) -> PipelineState {
        match self {
            PipelineStep::Authenticate => PipelineState::Authenticated,
            PipelineStep::Negotiate => PipelineState::SessionNegotiated,
            PipelineStep::Upload => PipelineState::Uploaded,
            PipelineStep::Attach => PipelineState::Attached,
            PipelineStep::Submit => PipelineState::Submitted,
        }
    }

    /// Short human-readable description
    pub fn description(self) -> &'static str {
        match self {
            PipelineStep::Authenticate => "Requesting access token",
            PipelineStep::Negotiate => "Requesting upload URL",
            PipelineStep::Upload => "Uploading artifact",
            PipelineStep::Attach => "Attaching file to app",
            PipelineStep::Submit => "Submitting app for review",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::Authenticate => write!(f, "Authenticate"),
            PipelineStep::Negotiate => write!(f, "Negotiate"),
            PipelineStep::Upload => write!(f, "Upload"),
            PipelineStep::Attach => write!(f, "Attach"),
            PipelineStep::Submit => write!(f, "Submit"),
        }
    }
}

/// Progress of a publishing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Start,
    Authenticated,
    SessionNegotiated,
    Uploaded,
    Attached,
    Submitted,
    Failed { step: PipelineStep },
}

impl PipelineState {
    /// Step that moves this state forward, `None` once terminal
    pub fn pending_step(self) -> Option<PipelineStep> {
        match self {
            PipelineState::Start => Some(PipelineStep::Authenticate),
            PipelineState::Authenticated => Some(PipelineStep::Negotiate),
            PipelineState::SessionNegotiated => Some(PipelineStep::Upload),
            PipelineState::Uploaded => Some(PipelineStep::Attach),
            PipelineState::Attached => Some(PipelineStep::Submit),
            PipelineState::Submitted | PipelineState::Failed { .. } => None,
        }
    }

    /// Move forward after `step` succeeded
    ///
    /// Returns `None` if `step` is not the pending step of this state.
    pub fn advance(self, step: PipelineStep) -> Option<PipelineState> {
        (self.pending_step() == Some(step)).then(|| step.completed_state())
    }

    /// Move to the failed state for `step`
    pub fn fail(self, step: PipelineStep) -> PipelineState {
        PipelineState::Failed { step }
    }

    pub fn is_terminal(self) -> bool {
        self.pending_step().is_none()
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Start => write!(f, "Start"),
            PipelineState::Authenticated => write!(f, "Authenticated"),
            PipelineState::SessionNegotiated => write!(f, "Session Negotiated"),
            PipelineState::Uploaded => write!(f, "Uploaded"),
            PipelineState::Attached => write!(f, "Attached"),
            PipelineState::Submitted => write!(f, "Submitted"),
            PipelineState::Failed { step } => write!(f, "Failed ({})", step),
        }
    }
}

/// Time taken by one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTiming {
    pub step: PipelineStep,
    pub duration_ms: u64,
}

/// Result of a successful publishing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutcome {
    /// Application that was submitted
    pub app_id: String,

    /// Where the uploaded artifact is stored
    pub file_dest_url: StorageReference,

    /// Final state, always `Submitted`
    pub state: PipelineState,

    /// Per-step timings in execution order
    pub steps: Vec<StepTiming>,

    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}
