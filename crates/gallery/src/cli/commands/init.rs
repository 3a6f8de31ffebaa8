//! Init command

use std::path::PathBuf;

use clap::Args;
use console::style;
use dialoguer::{Confirm, Select};
use tracing::info;

use gallery_core::config::defaults::{
    DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_TOML_TEMPLATE, DEFAULT_CONFIG_YAML,
};

use crate::cli::output;
use crate::cli::Cli;

/// Initialize a new Gallery configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Use defaults without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write TOML instead of YAML
    #[arg(long)]
    pub toml: bool,
}

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
}

impl Format {
    fn template(self) -> &'static str {
        match self {
            Format::Yaml => DEFAULT_CONFIG_TEMPLATE,
            Format::Toml => DEFAULT_CONFIG_TOML_TEMPLATE,
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            Format::Yaml => DEFAULT_CONFIG_YAML,
            Format::Toml => DEFAULT_CONFIG_TOML,
        }
    }
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, yes = self.yes, "executing init command");
        let cwd = std::env::current_dir()?;

        // Choose format if not specified
        let format = if self.toml {
            Format::Toml
        } else if self.yes || self.output.is_some() {
            self.format_from_output()
        } else {
            let formats = vec!["yaml", "toml"];
            let selection = Select::new()
                .with_prompt("Configuration format")
                .items(&formats)
                .default(0)
                .interact()?;
            if selection == 1 {
                Format::Toml
            } else {
                Format::Yaml
            }
        };

        let config_path = self
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(format.file_name()));

        // Check if config already exists
        if config_path.exists() && !self.force {
            if self.yes {
                anyhow::bail!(
                    "Configuration file already exists at {}. Use --force to overwrite.",
                    config_path.display()
                );
            }

            let overwrite = Confirm::new()
                .with_prompt(format!(
                    "Configuration file already exists at {}. Overwrite?",
                    config_path.display()
                ))
                .default(false)
                .interact()?;

            if !overwrite {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
        }

        std::fs::write(&config_path, format.template())?;
        info!(path = %config_path.display(), "wrote configuration");

        if !cli.quiet {
            output::success(&format!(
                "Created configuration at {}",
                output::path_style().apply_to(config_path.display())
            ));
            println!();
            println!("Next steps:");
            println!(
                "  1. Set {} and {} in {}",
                style("path").bold(),
                style("app_id").bold(),
                config_path.display()
            );
            println!(
                "  2. Export {} and {}",
                style("AGC_CLIENT_ID").cyan(),
                style("AGC_CLIENT_SECRET").cyan()
            );
            println!("  3. Run {} to verify your setup", style("gallery validate").cyan());
            println!("  4. Run {} to upload and submit", style("gallery publish").cyan());
        }

        Ok(())
    }

    fn format_from_output(&self) -> Format {
        match &self.output {
            Some(path) if path.extension().is_some_and(|e| e == "toml") => Format::Toml,
            _ => Format::Yaml,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(output: Option<PathBuf>, toml: bool) -> InitCommand {
        InitCommand {
            force: false,
            yes: true,
            output,
            toml,
        }
    }

    #[test]
    fn test_format_follows_output_extension() {
        let cmd = command(Some(PathBuf::from("ci/gallery.toml")), false);
        assert_eq!(cmd.format_from_output(), Format::Toml);

        let cmd = command(Some(PathBuf::from("gallery.yml")), false);
        assert_eq!(cmd.format_from_output(), Format::Yaml);

        let cmd = command(None, false);
        assert_eq!(cmd.format_from_output(), Format::Yaml);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(Format::Yaml.file_name(), "gallery.yaml");
        assert_eq!(Format::Toml.file_name(), "gallery.toml");
        assert!(Format::Toml.template().contains("[retry]"));
    }
}
