//! Default configuration values

use super::types::PublishConfig;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "gallery.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "gallery.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".gallery.toml",
        ".gallery.yaml",
    ]
}

/// Generate default configuration YAML
pub fn default_config_yaml() -> String {
    let config = PublishConfig::default();
    serde_yaml::to_string(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    let config = PublishConfig::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TOML_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Gallery Configuration
# Credentials can also be set with AGC_CLIENT_ID, AGC_CLIENT_SECRET and AGC_APP_ID

path: app/build/outputs/apk/release/app-release.apk
client_id: ""
app_id: ""
suffix: apk

api:
  base_url: https://connect-api.cloud.huawei.com
  timeout_secs: 300

retry:
  max_attempts: 3
  initial_delay_ms: 500
  max_delay_ms: 8000

artifact:
  file_type: "5"
  file_name: app.apk
  mime_type: application/vnd.android.package-archive
"#;

/// Default configuration template (TOML)
pub const DEFAULT_CONFIG_TOML_TEMPLATE: &str = r#"# Gallery Configuration
# Credentials can also be set with AGC_CLIENT_ID, AGC_CLIENT_SECRET and AGC_APP_ID

path = "app/build/outputs/apk/release/app-release.apk"
client_id = ""
app_id = ""
suffix = "apk"

[api]
base_url = "https://connect-api.cloud.huawei.com"
timeout_secs = 300

[retry]
max_attempts = 3
initial_delay_ms = 500
max_delay_ms = 8000

[artifact]
file_type = "5"
file_name = "app.apk"
mime_type = "application/vnd.android.package-archive"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        let yaml: PublishConfig = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        let toml: PublishConfig = toml::from_str(DEFAULT_CONFIG_TOML_TEMPLATE).unwrap();
        assert_eq!(yaml.suffix, "apk");
        assert_eq!(toml.retry.max_delay_ms, 8000);
        assert_eq!(yaml.artifact.file_type, toml.artifact.file_type);
    }

    #[test]
    fn test_generated_defaults_round_trip() {
        let yaml: PublishConfig = serde_yaml::from_str(&default_config_yaml()).unwrap();
        assert_eq!(yaml.api.timeout_secs, 300);
        assert!(yaml.secret.is_none());

        let toml: PublishConfig = toml::from_str(&default_config_toml()).unwrap();
        assert_eq!(toml.retry.max_attempts, 3);
    }

    #[test]
    fn test_generated_defaults_omit_secret() {
        assert!(!default_config_yaml().contains("secret"));
        assert!(!default_config_toml().contains("secret"));
    }
}
