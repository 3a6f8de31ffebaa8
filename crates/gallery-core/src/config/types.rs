//! Configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use gallery_connect::{
    ArtifactProfile, ClientOptions, PublishOptions, PublishRequest, RetryPolicy,
    DEFAULT_BASE_URL,
};

use super::validation::validate_config;
use crate::error::{ConfigError, Result};

/// Publishing configuration for Gallery
///
/// The five request fields may come from a config file, the environment or
/// command-line flags; the sections tune the pipeline.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Path to the artifact to upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Client secret of the Connect API client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Client id of the Connect API client
    #[serde(alias = "clientId", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Application id in AppGallery Connect
    #[serde(alias = "appId", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// File suffix passed to upload negotiation (e.g., "apk")
    pub suffix: String,

    /// API endpoint configuration
    pub api: ApiConfig,

    /// Retry configuration
    pub retry: RetryConfig,

    /// Artifact type configuration
    pub artifact: ArtifactConfig,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            path: None,
            secret: None,
            client_id: None,
            app_id: None,
            suffix: "apk".to_string(),
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            artifact: ArtifactConfig::default(),
        }
    }
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("path", &self.path)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("app_id", &self.app_id)
            .field("suffix", &self.suffix)
            .field("api", &self.api)
            .field("retry", &self.retry)
            .field("artifact", &self.artifact)
            .finish()
    }
}

/// API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the Connect API
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Limit for the whole run in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 300,
            deadline_secs: None,
        }
    }
}

/// Retry configuration for token, negotiation and attach requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Upper bound for the backoff delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// Artifact type configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Platform file type code
    pub file_type: String,

    /// File name registered on the app
    pub file_name: String,

    /// MIME type of the uploaded file part
    pub mime_type: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        let profile = ArtifactProfile::android_package();
        Self {
            file_type: profile.file_type,
            file_name: profile.file_name,
            mime_type: profile.mime_type,
        }
    }
}

impl PublishConfig {
    /// Build the pipeline request, validating the configuration first
    pub fn publish_request(&self) -> Result<PublishRequest> {
        validate_config(self)?;

        Ok(PublishRequest::new(
            required(&self.path, "path")?.clone(),
            required(&self.client_id, "client_id")?,
            required(&self.secret, "secret")?,
            required(&self.app_id, "app_id")?,
            self.suffix.clone(),
        ))
    }

    /// HTTP client options
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::default()
            .with_base_url(self.api.base_url.clone())
            .with_timeout(Duration::from_secs(self.api.timeout_secs))
    }

    /// Retry policy for the retried steps
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.retry.max_attempts)
            .with_delays(
                Duration::from_millis(self.retry.initial_delay_ms),
                Duration::from_millis(self.retry.max_delay_ms),
            )
    }

    /// File type constants for upload and attach
    pub fn artifact_profile(&self) -> ArtifactProfile {
        ArtifactProfile {
            file_type: self.artifact.file_type.clone(),
            file_name: self.artifact.file_name.clone(),
            mime_type: self.artifact.mime_type.clone(),
        }
    }

    /// Limit for the whole run
    pub fn deadline(&self) -> Option<Duration> {
        self.api.deadline_secs.map(Duration::from_secs)
    }

    /// Pipeline options assembled from the sections
    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            retry: self.retry_policy(),
            profile: self.artifact_profile(),
            deadline: self.deadline(),
        }
    }
}

/// Value of a required field, or `MissingField` when absent or blank
pub(crate) fn required<'a, T>(value: &'a Option<T>, field: &str) -> Result<&'a T>
where
    T: AsRef<std::ffi::OsStr>,
{
    match value {
        Some(v) if !is_blank(v.as_ref()) => Ok(v),
        _ => Err(ConfigError::MissingField(field.to_string())),
    }
}

fn is_blank(value: &std::ffi::OsStr) -> bool {
    match value.to_str() {
        Some(s) => s.trim().is_empty(),
        None => value.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> PublishConfig {
        PublishConfig {
            path: Some(PathBuf::from("app-release.apk")),
            secret: Some("secret-1".to_string()),
            client_id: Some("client-1".to_string()),
            app_id: Some("1234".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = PublishConfig::default();
        assert_eq!(config.suffix, "apk");
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 300);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.artifact.file_type, "5");
        assert_eq!(config.artifact.file_name, "app.apk");
    }

    #[test]
    fn test_camel_case_aliases() {
        let config: PublishConfig = serde_yaml::from_str(
            "path: app.apk\nsecret: s\nclientId: c\nappId: a\n",
        )
        .unwrap();
        assert_eq!(config.client_id.as_deref(), Some("c"));
        assert_eq!(config.app_id.as_deref(), Some("a"));
        assert_eq!(config.suffix, "apk");
    }

    #[test]
    fn test_publish_request() {
        let request = complete().publish_request().unwrap();
        assert_eq!(request.client_id(), "client-1");
        assert_eq!(request.client_secret(), "secret-1");
        assert_eq!(request.application_id(), "1234");
        assert_eq!(request.file_suffix(), "apk");
        assert_eq!(request.artifact_path(), PathBuf::from("app-release.apk"));
    }

    #[test]
    fn test_publish_request_missing_secret() {
        let mut config = complete();
        config.secret = None;
        let err = config.publish_request().unwrap_err();
        assert_eq!(err.field(), Some("secret"));
    }

    #[test]
    fn test_blank_app_id_is_missing() {
        let mut config = complete();
        config.app_id = Some(String::new());
        let err = config.publish_request().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "app_id"));
    }

    #[test]
    fn test_whitespace_secret_is_missing() {
        let mut config = complete();
        config.secret = Some("   ".to_string());
        let err = config.publish_request().unwrap_err();
        assert_eq!(err.field(), Some("secret"));

        config.secret = Some(" secret-1 ".to_string());
        assert!(config.publish_request().is_ok());
    }

    #[test]
    fn test_conversions() {
        let mut config = complete();
        config.api.timeout_secs = 10;
        config.api.deadline_secs = Some(60);
        config.retry.max_attempts = 5;
        config.artifact.file_type = "3".to_string();

        assert_eq!(config.client_options().timeout, Duration::from_secs(10));
        assert_eq!(config.retry_policy().max_attempts, 5);
        assert_eq!(config.artifact_profile().file_type, "3");

        let options = config.publish_options();
        assert_eq!(options.deadline, Some(Duration::from_secs(60)));
        assert_eq!(options.retry.initial_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", complete());
        assert!(!rendered.contains("secret-1"));
        assert!(rendered.contains("<redacted>"));
    }
}
