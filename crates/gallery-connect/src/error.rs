//! Error types for the publishing pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::types::PipelineStep;

/// Failure of a single HTTP exchange with the Connect API
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success HTTP status; the raw body is kept for diagnostics
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Success status, but the body carried a non-zero `ret.code`
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Connection, timeout or IO failure below HTTP
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Success status, but the body was not JSON
    #[error("Invalid JSON response: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// HTTP status of the response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => {
                matches!(*status, 408 | 429) || (500..600).contains(status)
            }
            TransportError::Request(e) => e.is_timeout() || e.is_connect(),
            TransportError::Api { .. } | TransportError::Decode { .. } => false,
        }
    }
}

/// Errors raised by the individual publishing steps
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Token exchange failed or returned no token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Upload URL response was missing a field
    #[error("Upload session negotiation failed: {0}")]
    Negotiation(String),

    /// Artifact could not be opened for upload
    #[error("Artifact not found at {}: {source}", path.display())]
    ArtifactNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upload response did not have the expected structure
    #[error("Unexpected upload response: {0}")]
    UploadResponseShape(String),

    /// Registering the uploaded file against the app failed
    #[error("Failed to attach file to app: {0}")]
    Attach(String),

    /// Submitting the app for review failed
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Network or status failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Cancelled by the caller or the run deadline passed
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid pipeline input
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ConnectError {
    /// Whether the failure is a transient transport failure
    pub fn is_transient(&self) -> bool {
        matches!(self, ConnectError::Transport(e) if e.is_transient())
    }
}

/// Terminal failure of a pipeline run
#[derive(Debug, Error)]
#[error("{step} step failed: {source}")]
pub struct PipelineError {
    /// Step that was running when the failure occurred
    pub step: PipelineStep,

    /// Underlying cause
    #[source]
    pub source: ConnectError,
}

impl PipelineError {
    pub fn new(step: PipelineStep, source: ConnectError) -> Self {
        Self { step, source }
    }

    /// Whether the run was cancelled rather than failing on its own
    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, ConnectError::Cancelled)
    }
}

/// Result type for pipeline step operations
pub type Result<T> = std::result::Result<T, ConnectError>;
