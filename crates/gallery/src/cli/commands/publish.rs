//! Publish command
//!
//! Runs the AppGallery Connect pipeline for one artifact.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::{info, warn};

use gallery_connect::{
    CancellationToken, ConnectError, Pipeline, ProgressSink, PublishOutcome, PublishRequest,
    TracingSink,
};
use gallery_core::config::PublishConfig;

use crate::cli::output::{self, ConsoleSink};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes::{self, ExitStatus};

/// Settings that override the configuration file
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Path to the artifact (apk, aab)
    pub artifact: Option<PathBuf>,

    /// Connect API client id
    #[arg(long, env = "AGC_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Connect API client secret
    #[arg(long, env = "AGC_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Application id
    #[arg(long, env = "AGC_APP_ID")]
    pub app_id: Option<String>,

    /// File suffix (e.g., apk, aab)
    #[arg(long)]
    pub suffix: Option<String>,

    /// Connect API base URL
    #[arg(long, env = "AGC_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Time limit for the whole run in seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Attempts for token, upload URL and attach requests
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Platform file type code
    #[arg(long)]
    pub file_type: Option<String>,

    /// File name registered on the app
    #[arg(long)]
    pub file_name: Option<String>,
}

impl PublishArgs {
    /// Apply the given flags on top of `config`
    pub fn apply(&self, config: &mut PublishConfig) {
        if let Some(artifact) = &self.artifact {
            config.path = Some(artifact.clone());
        }
        if let Some(client_id) = &self.client_id {
            config.client_id = Some(client_id.clone());
        }
        if let Some(secret) = &self.client_secret {
            config.secret = Some(secret.clone());
        }
        if let Some(app_id) = &self.app_id {
            config.app_id = Some(app_id.clone());
        }
        if let Some(suffix) = &self.suffix {
            config.suffix = suffix.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.api.timeout_secs = timeout;
        }
        if let Some(deadline) = self.deadline {
            config.api.deadline_secs = Some(deadline);
        }
        if let Some(retries) = self.retries {
            config.retry.max_attempts = retries;
        }
        if let Some(file_type) = &self.file_type {
            config.artifact.file_type = file_type.clone();
        }
        if let Some(file_name) = &self.file_name {
            config.artifact.file_name = file_name.clone();
        }
    }
}

/// Upload an artifact and submit the app for review
#[derive(Debug, Args)]
pub struct PublishCommand {
    #[command(flatten)]
    pub args: PublishArgs,

    /// Validate configuration and artifact without contacting the API
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, "executing publish command");

        let (mut config, config_path) = cli.load_config()?;
        self.args.apply(&mut config);
        let request = config.publish_request()?;

        if let Some(path) = &config_path {
            info!(path = %path.display(), "using config file");
        }

        if self.dry_run {
            return self.dry_run(cli, &config, &request);
        }

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli, &config, request))
    }

    async fn execute_async(
        &self,
        cli: &Cli,
        config: &PublishConfig,
        request: PublishRequest,
    ) -> anyhow::Result<()> {
        let cancel = CancellationToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, cancelling publish");
                    cancel.cancel();
                }
            })
        };

        if cli.shows_text() {
            println!(
                "{} {} to app {}",
                style("Publishing").cyan(),
                style(request.artifact_path().display()).bold(),
                style(request.application_id()).bold()
            );
            println!();
        }

        let sink: Arc<dyn ProgressSink> = if cli.shows_text() {
            Arc::new(ConsoleSink)
        } else {
            Arc::new(TracingSink)
        };

        let result = Pipeline::new(request, &config.client_options())?
            .with_options(config.publish_options())
            .with_sink(sink)
            .with_cancellation(cancel)
            .run()
            .await;

        interrupt.abort();

        match result {
            Ok(outcome) => {
                self.print_outcome(cli, &outcome)?;
                Ok(())
            }
            Err(err) => {
                match cli.format {
                    OutputFormat::Json => {
                        let output = serde_json::json!({
                            "success": false,
                            "step": err.step,
                            "error": err.source.to_string(),
                        });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text if cli.quiet => output::error(&err.to_string()),
                    OutputFormat::Text => {}
                }
                Err(ExitStatus(exit_codes::for_connect_error(&err.source)).into())
            }
        }
    }

    fn print_outcome(&self, cli: &Cli, outcome: &PublishOutcome) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "success": true,
                    "outcome": outcome,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!();
                    println!("{}", output::key_value("App", &outcome.app_id));
                    println!(
                        "{}",
                        output::key_value("File", outcome.file_dest_url.as_str())
                    );
                    println!(
                        "{}",
                        output::key_value("Submitted", &outcome.submitted_at.to_rfc3339())
                    );
                }
            }
        }
        Ok(())
    }

    /// Check that the request is complete and the artifact readable
    fn dry_run(
        &self,
        cli: &Cli,
        config: &PublishConfig,
        request: &PublishRequest,
    ) -> anyhow::Result<()> {
        let path = request.artifact_path();
        let size = std::fs::File::open(path)
            .and_then(|file| file.metadata())
            .and_then(|meta| {
                if meta.is_file() {
                    Ok(meta.len())
                } else {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "not a regular file",
                    ))
                }
            })
            .map_err(|source| ConnectError::ArtifactNotFound {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), size, "dry run passed");

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "dry_run": true,
                    "valid": true,
                    "artifact": path,
                    "size": size,
                    "app_id": request.application_id(),
                    "suffix": request.file_suffix(),
                    "base_url": config.api.base_url,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", output::header("Dry run"));
                    println!(
                        "{}",
                        output::key_value(
                            "Artifact",
                            &output::path_style().apply_to(path.display()).to_string()
                        )
                    );
                    println!("{}", output::key_value("Size", &format!("{} bytes", size)));
                    println!("{}", output::key_value("App", request.application_id()));
                    println!("{}", output::key_value("Suffix", request.file_suffix()));
                    println!("{}", output::key_value("Endpoint", &config.api.base_url));
                    println!();
                    output::success("Ready to publish (no requests were sent)");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> PublishCommand {
        let mut argv = vec!["gallery", "publish"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            crate::cli::Commands::Publish(cmd) => cmd,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let cmd = parse(&[
            "build/app.aab",
            "--client-id",
            "cli-client",
            "--client-secret",
            "cli-secret",
            "--app-id",
            "777",
            "--suffix",
            "aab",
            "--base-url",
            "http://localhost:9000",
            "--timeout",
            "20",
            "--deadline",
            "600",
            "--retries",
            "1",
            "--file-type",
            "3",
            "--file-name",
            "app.aab",
        ]);

        let mut config = PublishConfig {
            client_id: Some("file-client".to_string()),
            ..Default::default()
        };
        cmd.args.apply(&mut config);

        assert_eq!(config.path, Some(PathBuf::from("build/app.aab")));
        assert_eq!(config.client_id.as_deref(), Some("cli-client"));
        assert_eq!(config.secret.as_deref(), Some("cli-secret"));
        assert_eq!(config.app_id.as_deref(), Some("777"));
        assert_eq!(config.suffix, "aab");
        assert_eq!(config.api.base_url, "http://localhost:9000");
        assert_eq!(config.api.timeout_secs, 20);
        assert_eq!(config.api.deadline_secs, Some(600));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.artifact.file_type, "3");
        assert_eq!(config.artifact.file_name, "app.aab");
        assert!(!cmd.dry_run);
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let cmd = parse(&["--dry-run"]);
        let mut config = PublishConfig {
            path: Some(PathBuf::from("from-file.apk")),
            app_id: Some("1".to_string()),
            ..Default::default()
        };
        let before = config.clone();

        // Credentials may still arrive through AGC_* variables
        let env_set = cmd.args.client_id.is_some()
            || cmd.args.client_secret.is_some()
            || cmd.args.app_id.is_some()
            || cmd.args.base_url.is_some();
        cmd.args.apply(&mut config);

        assert!(cmd.dry_run);
        assert_eq!(config.path, before.path);
        assert_eq!(config.suffix, before.suffix);
        assert_eq!(config.retry.max_attempts, before.retry.max_attempts);
        if !env_set {
            assert_eq!(config.app_id, before.app_id);
            assert_eq!(config.api.base_url, before.api.base_url);
        }
    }
}
