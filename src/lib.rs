//! Institution Finder: discovers academic institutions offering a set of programs
//!
//! This crate drives a paginated public search service region by region, extracts
//! contact and location details for every matching institution, and hands each
//! record to an output sink. Countries without a searchable registry are served
//! from pre-collected JSON files instead.

pub mod config;
pub mod crawler;
pub mod output;
pub mod source;
pub mod state;

use thiserror::Error;

/// Main error type for Institution Finder operations
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Institutions file is not a JSON array: {path}")]
    ContentNotArray { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Institution Finder operations
pub type Result<T> = std::result::Result<T, FinderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{DiscoveryOrchestrator, RegionPaginator};
pub use output::{Institution, InstitutionSink};
pub use source::InstitutionSource;
pub use state::RegionProgress;
