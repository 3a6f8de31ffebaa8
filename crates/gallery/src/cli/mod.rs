//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::io::Write;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::{debug, info};

use gallery_core::config::{load_config, load_config_or_default, PublishConfig};

use commands::{InitCommand, PublishCommand, ValidateCommand};

/// Gallery - publish Android builds to AppGallery Connect
#[derive(Debug, Parser)]
#[command(name = "gallery")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: search for gallery.toml / gallery.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload an artifact and submit the app for review
    Publish(PublishCommand),

    /// Validate configuration and artifact
    Validate(ValidateCommand),

    /// Initialize a new Gallery configuration
    Init(InitCommand),

    /// Print a shell completion script to stdout
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Publish(ref cmd) => cmd.execute(&self),
            Commands::Validate(ref cmd) => cmd.execute(&self),
            Commands::Init(ref cmd) => cmd.execute(&self),
            Commands::Completions { shell } => {
                info!(shell = %shell, "generating completions");
                Self::write_completions(shell, &mut std::io::stdout())
            }
        }
    }

    /// Write the completion script for `shell` to `out`
    pub fn write_completions(shell: Shell, out: &mut dyn Write) -> anyhow::Result<()> {
        let mut script = Vec::new();
        clap_complete::generate(shell, &mut Cli::command(), "gallery", &mut script);
        out.write_all(&script)?;
        Ok(())
    }

    /// Whether human-readable progress should be printed
    pub fn shows_text(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }

    /// Load the configuration named by `--config`, or search for one
    ///
    /// Without `--config`, a missing file yields the defaults.
    pub fn load_config(&self) -> anyhow::Result<(PublishConfig, Option<PathBuf>)> {
        if let Some(path) = &self.config {
            let config = load_config(path)?;
            return Ok((config, Some(path.clone())));
        }

        let cwd = std::env::current_dir()?;
        let (config, path) = load_config_or_default(&cwd)?;
        debug!(config = ?config, "resolved configuration");
        Ok((config, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gallery",
            "validate",
            "--format",
            "json",
            "--config",
            "ci/gallery.toml",
            "-q",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("ci/gallery.toml")));
        assert!(cli.quiet);
        assert!(!cli.shows_text());
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn test_load_explicit_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        std::fs::write(&path, "appId: \"99\"\nsuffix: aab\n").unwrap();

        let path_arg = path.to_string_lossy().to_string();
        let cli =
            Cli::try_parse_from(["gallery", "validate", "--config", path_arg.as_str()]).unwrap();

        let (config, found) = cli.load_config().unwrap();
        assert_eq!(config.app_id.as_deref(), Some("99"));
        assert_eq!(config.suffix, "aab");
        assert_eq!(found, Some(path));
    }

    #[test]
    fn test_completions_list_commands_and_flags() {
        let cli = Cli::try_parse_from(["gallery", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Commands::Completions { shell: Shell::Bash }));

        let mut out = Vec::new();
        Cli::write_completions(Shell::Bash, &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("publish"));
        assert!(script.contains("--client-id"));
        assert!(script.contains("--dry-run"));
    }

    #[test]
    fn test_completions_reject_unknown_shell() {
        assert!(Cli::try_parse_from(["gallery", "completions", "tcsh"]).is_err());
    }
}
