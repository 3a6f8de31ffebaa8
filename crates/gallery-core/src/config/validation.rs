//! Configuration validation

use tracing::debug;
use url::Url;

use crate::error::{ConfigError, Result};

use super::types::{required, PublishConfig};

/// Validate a complete configuration, including the request fields
pub fn validate_config(config: &PublishConfig) -> Result<()> {
    debug!("validating configuration");
    validate_request_fields(config)?;
    validate_settings(config)?;
    debug!("configuration validation passed");
    Ok(())
}

/// Validate everything except the request fields
///
/// Config files commonly leave credentials to the environment, so loading a
/// file only checks the settings that cannot come from anywhere else.
pub fn validate_settings(config: &PublishConfig) -> Result<()> {
    validate_suffix(&config.suffix)?;
    validate_api(config)?;
    validate_retry(config)?;
    validate_artifact(config)?;
    Ok(())
}

fn validate_request_fields(config: &PublishConfig) -> Result<()> {
    required(&config.path, "path")?;
    required(&config.client_id, "client_id")?;
    required(&config.secret, "secret")?;
    required(&config.app_id, "app_id")?;
    Ok(())
}

fn validate_suffix(suffix: &str) -> Result<()> {
    if suffix.is_empty() {
        return Err(ConfigError::MissingField("suffix".to_string()));
    }

    if suffix.starts_with('.') {
        return Err(ConfigError::invalid(
            "suffix",
            "must not start with a dot (use \"apk\", not \".apk\")",
        ));
    }

    if !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::invalid("suffix", "must be alphanumeric"));
    }

    Ok(())
}

fn validate_api(config: &PublishConfig) -> Result<()> {
    let url = Url::parse(&config.api.base_url)
        .map_err(|e| ConfigError::invalid("api.base_url", e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "api.base_url",
            "must be an http or https URL",
        ));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "api.timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.api.deadline_secs == Some(0) {
        return Err(ConfigError::invalid(
            "api.deadline_secs",
            "must be greater than zero",
        ));
    }

    Ok(())
}

fn validate_retry(config: &PublishConfig) -> Result<()> {
    if config.retry.max_attempts == 0 {
        return Err(ConfigError::invalid(
            "retry.max_attempts",
            "must be at least 1",
        ));
    }

    if config.retry.initial_delay_ms > config.retry.max_delay_ms {
        return Err(ConfigError::invalid(
            "retry.initial_delay_ms",
            "must not exceed retry.max_delay_ms",
        ));
    }

    Ok(())
}

fn validate_artifact(config: &PublishConfig) -> Result<()> {
    let fields = [
        ("artifact.file_type", &config.artifact.file_type),
        ("artifact.file_name", &config.artifact.file_name),
        ("artifact.mime_type", &config.artifact.mime_type),
    ];

    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(field.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn complete() -> PublishConfig {
        PublishConfig {
            path: Some(PathBuf::from("app.apk")),
            secret: Some("s".to_string()),
            client_id: Some("c".to_string()),
            app_id: Some("a".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_complete_config() {
        assert!(validate_config(&complete()).is_ok());
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&PublishConfig::default()).is_ok());
    }

    #[test]
    fn test_missing_fields_are_named() {
        for field in ["path", "client_id", "secret", "app_id"] {
            let mut config = complete();
            match field {
                "path" => config.path = None,
                "client_id" => config.client_id = None,
                "secret" => config.secret = Some("  \t".to_string()),
                _ => config.app_id = None,
            }
            let err = validate_config(&config).unwrap_err();
            assert_eq!(err.field(), Some(field));
        }
    }

    #[test]
    fn test_suffix_rules() {
        let mut config = complete();
        config.suffix = ".apk".to_string();
        assert_eq!(validate_config(&config).unwrap_err().field(), Some("suffix"));

        config.suffix = "ap k".to_string();
        assert!(validate_config(&config).is_err());

        config.suffix = "aab".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = complete();
        config.api.base_url = "not a url".to_string();
        assert_eq!(
            validate_config(&config).unwrap_err().field(),
            Some("api.base_url")
        );

        config.api.base_url = "ftp://connect.example".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_and_attempts() {
        let mut config = complete();
        config.api.timeout_secs = 0;
        assert_eq!(
            validate_config(&config).unwrap_err().field(),
            Some("api.timeout_secs")
        );

        let mut config = complete();
        config.retry.max_attempts = 0;
        assert_eq!(
            validate_config(&config).unwrap_err().field(),
            Some("retry.max_attempts")
        );
    }

    #[test]
    fn test_blank_artifact_field() {
        let mut config = complete();
        config.artifact.file_name = " ".to_string();
        assert_eq!(
            validate_config(&config).unwrap_err().field(),
            Some("artifact.file_name")
        );
    }
}
