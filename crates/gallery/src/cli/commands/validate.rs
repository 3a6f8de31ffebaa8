//! Validate command

use clap::Args;
use console::style;
use tracing::info;

use gallery_core::config::validate_config;

use super::publish::PublishArgs;
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes::{self, ExitStatus};

/// Validate configuration and artifact
#[derive(Debug, Args)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub args: PublishArgs,

    /// Only validate configuration, not the artifact
    #[arg(long)]
    pub config_only: bool,

    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            config_only = self.config_only,
            strict = self.strict,
            "executing validate command"
        );

        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        let (config, config_path) = match cli.load_config() {
            Ok((mut config, path)) => {
                self.args.apply(&mut config);
                (Some(config), path)
            }
            Err(e) => {
                errors.push(format!("Configuration: {:#}", e));
                (None, None)
            }
        };

        if config.is_some() && config_path.is_none() {
            warnings.push("No configuration file found, using defaults".to_string());
        }

        if let Some(ref cfg) = config {
            if let Err(e) = validate_config(cfg) {
                errors.push(format!("Configuration validation: {}", e));
            }

            if cfg.api.base_url.starts_with("http://") {
                warnings.push(format!(
                    "API base URL {} is not using https",
                    cfg.api.base_url
                ));
            }

            if cfg.retry.max_attempts == 1 {
                warnings.push("Retries are disabled (retry.max_attempts = 1)".to_string());
            }

            if !self.config_only {
                match cfg.path.as_deref() {
                    Some(path) if path.is_file() => {
                        let matches_suffix = path
                            .extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case(&cfg.suffix));
                        if !matches_suffix {
                            warnings.push(format!(
                                "Artifact {} does not end in .{}",
                                path.display(),
                                cfg.suffix
                            ));
                        }
                    }
                    Some(path) => {
                        errors.push(format!("Artifact not found at {}", path.display()));
                    }
                    // Already reported as a missing field
                    None => {}
                }
            }
        }

        // If strict, promote warnings to errors
        if self.strict {
            errors.append(&mut warnings);
        }

        let passed = errors.is_empty();

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "valid": passed,
                    "config_path": config_path.map(|p| p.to_string_lossy().to_string()),
                    "errors": errors,
                    "warnings": warnings
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", style("Validation Results").bold());
                    println!();

                    if let Some(path) = config_path {
                        println!("Config: {}", style(path.display()).cyan());
                        println!();
                    }

                    if !errors.is_empty() {
                        println!("{}", style("Errors:").red().bold());
                        for error in &errors {
                            println!("  {} {}", style("✗").red(), error);
                        }
                        println!();
                    }

                    if !warnings.is_empty() {
                        println!("{}", style("Warnings:").yellow().bold());
                        for warning in &warnings {
                            println!("  {} {}", style("!").yellow(), warning);
                        }
                        println!();
                    }

                    if passed {
                        if warnings.is_empty() {
                            println!("{}", style("✓ All checks passed").green().bold());
                        } else {
                            println!(
                                "{} with {} warning(s)",
                                style("✓ Validation passed").green().bold(),
                                warnings.len()
                            );
                        }
                    } else {
                        println!(
                            "{} with {} error(s)",
                            style("✗ Validation failed").red().bold(),
                            errors.len()
                        );
                    }
                }
            }
        }

        if !passed {
            return Err(ExitStatus(exit_codes::CONFIG_ERROR).into());
        }

        Ok(())
    }
}
