//! Configuration module for Institution Finder
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing registry URL for the registry-backed country is the only
//! unrecoverable condition, and it is caught here before any discovery starts.
//!
//! # Example
//!
//! ```no_run
//! use institution_finder::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Searching {} regions", config.finder.regions.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FinderConfig, HttpConfig, OutputConfig, DEFAULT_PROGRAM_FILTER, DEFAULT_REGIONS,
    REGISTRY_COUNTRY,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
