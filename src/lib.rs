//! Linkscout: a broken link collector
//!
//! This crate implements the coordination engine of a site crawler that discovers,
//! renders, extracts links from and verifies every resource reachable from a start
//! URL, then reports which of them are broken.

pub mod bot;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Linkscout operations
#[derive(Debug, Error)]
pub enum LinkscoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Failed to render {url}: {message}")]
    Render { url: String, message: String },

    #[error("Resource has no absolute URI: {0}")]
    MissingUri(String),

    #[error("Statistics error: {0}")]
    Statistics(#[from] crawler::StatisticsError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Coordinator no longer accepts processing results")]
    CoordinatorClosed,

    #[error("Workflow activation failed for {start_url}")]
    Activation { start_url: String },
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

    #[error("Uri scheme [{0}] is not supported")]
    UnsupportedScheme(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Relative URL '{0}' has no parent to resolve against")]
    Orphaned(String),
}

/// Result type alias for Linkscout operations
pub type Result<T> = std::result::Result<T, LinkscoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use bot::Bot;
pub use config::Config;
pub use model::{Event, ProcessingResult, Resource, ResourceType, StatusCode};
pub use state::{BotState, CrawlerState, WorkflowState};
pub use crate::url::{normalize_url, ResourceScope};
