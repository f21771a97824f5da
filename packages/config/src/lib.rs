// ABOUTME: Configuration for the Docket review workflow
// ABOUTME: Environment variable names and validated runtime settings

pub mod constants;
pub mod settings;

pub use settings::{docket_dir, Config, ConfigError};
