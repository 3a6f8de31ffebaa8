//! Exit codes for the CLI

use gallery_connect::{ConnectError, PipelineError};
use gallery_core::ConfigError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Authentication failure
pub const AUTH_ERROR: i32 = 3;

/// Artifact not found
pub const ARTIFACT_NOT_FOUND: i32 = 4;

/// Remote or API failure
pub const REMOTE_ERROR: i32 = 5;

/// User cancelled
pub const CANCELLED: i32 = 130;

/// Failure that has already been reported to the user
#[derive(Debug, thiserror::Error)]
#[error("exit status {0}")]
pub struct ExitStatus(pub i32);

/// Exit code for a pipeline step error
pub fn for_connect_error(err: &ConnectError) -> i32 {
    match err {
        ConnectError::Auth(_) => AUTH_ERROR,
        ConnectError::ArtifactNotFound { .. } => ARTIFACT_NOT_FOUND,
        ConnectError::Cancelled => CANCELLED,
        ConnectError::Configuration(_) => CONFIG_ERROR,
        ConnectError::Negotiation(_)
        | ConnectError::UploadResponseShape(_)
        | ConnectError::Attach(_)
        | ConnectError::Submission(_)
        | ConnectError::Transport(_) => REMOTE_ERROR,
    }
}

/// Exit code for any error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(ExitStatus(code)) = err.downcast_ref::<ExitStatus>() {
        return *code;
    }
    if let Some(e) = err.downcast_ref::<PipelineError>() {
        return for_connect_error(&e.source);
    }
    if let Some(e) = err.downcast_ref::<ConnectError>() {
        return for_connect_error(e);
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return CONFIG_ERROR;
    }
    ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_connect::PipelineStep;

    #[test]
    fn test_pipeline_errors_map_by_cause() {
        let auth = PipelineError::new(PipelineStep::Authenticate, ConnectError::Auth("401".into()));
        assert_eq!(for_error(&auth.into()), AUTH_ERROR);

        let missing = PipelineError::new(
            PipelineStep::Upload,
            ConnectError::ArtifactNotFound {
                path: "app.apk".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        );
        assert_eq!(for_error(&missing.into()), ARTIFACT_NOT_FOUND);

        let cancelled = PipelineError::new(PipelineStep::Negotiate, ConnectError::Cancelled);
        assert_eq!(for_error(&cancelled.into()), CANCELLED);

        let submit = PipelineError::new(PipelineStep::Submit, ConnectError::Submission("503".into()));
        assert_eq!(for_error(&submit.into()), REMOTE_ERROR);
    }

    #[test]
    fn test_config_and_other_errors() {
        let config = ConfigError::MissingField("secret".into());
        assert_eq!(for_error(&config.into()), CONFIG_ERROR);

        assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
        assert_eq!(for_error(&ExitStatus(REMOTE_ERROR).into()), REMOTE_ERROR);
    }
}
