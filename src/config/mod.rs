//! Configuration module for Linkscout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use linkscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("linkscout.toml")).unwrap();
//! println!("Crawl starts at: {}", config.crawl.start_uri);
//! ```

mod parser;
mod types;
pub mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, PipelineConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
