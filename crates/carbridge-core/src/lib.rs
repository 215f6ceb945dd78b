//! Shared domain types and configuration for the carbridge workspace.

mod app_config;
mod config;
mod listings;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use listings::{ImportMode, NormalizedListing};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid import type: {0}")]
    InvalidImportMode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
