//! Gallery Core - configuration for the Gallery publishing CLI
//!
//! This crate loads, validates and converts the publishing configuration
//! into the inputs of the `gallery-connect` pipeline.

pub mod config;
pub mod error;

pub use config::{
    find_config, load_config, load_config_from_dir, load_config_or_default, validate_config,
    PublishConfig,
};
pub use error::{ConfigError, Result};
