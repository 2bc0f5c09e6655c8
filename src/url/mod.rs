//! URL handling module for Linkscout
//!
//! This module provides fragment-stripping normalization, relative URL
//! resolution and the resource scope that tells internal resources apart
//! from external ones.

mod domain;
mod normalize;

use crate::config::Config;
use crate::ConfigError;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, host_matches};
pub use normalize::{is_supported_scheme, normalize_url, resolve_url, strip_fragment};

/// Classifies URIs relative to the configured start URI
///
/// A URI is internal when its host equals the start host or the configured
/// remote host, compared case-insensitively.
#[derive(Debug, Clone)]
pub struct ResourceScope {
    start_uri: Url,
    start_host: String,
    remote_host: Option<String>,
}

impl ResourceScope {
    /// Creates a scope from the crawl configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ResourceScope)` - The start URI parsed and fragment-stripped
    /// * `Err(ConfigError)` - The start URI is not an absolute http/https URL
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let start_uri = normalize_url(&config.crawl.start_uri).map_err(|e| {
            ConfigError::InvalidUrl(format!("start-uri '{}': {}", config.crawl.start_uri, e))
        })?;
        Self::from_parts(start_uri, config.crawl.remote_host.as_deref())
    }

    /// Creates a scope from an already parsed start URI
    pub fn from_parts(start_uri: Url, remote_host: Option<&str>) -> Result<Self, ConfigError> {
        let start_uri = strip_fragment(start_uri);
        let start_host = extract_domain(&start_uri).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("start-uri '{}' has no host", start_uri))
        })?;
        let remote_host = remote_host
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty());

        Ok(Self {
            start_uri,
            start_host,
            remote_host,
        })
    }

    /// The start URI, fragment stripped
    pub fn start_uri(&self) -> &Url {
        &self.start_uri
    }

    /// Returns true if the URI lives on the start host or the remote host
    pub fn is_internal(&self, uri: &Url) -> bool {
        if host_matches(uri, &self.start_host) {
            return true;
        }
        match &self.remote_host {
            Some(remote_host) => host_matches(uri, remote_host),
            None => false,
        }
    }

    /// Returns true if the URI equals the start URI once its fragment is stripped
    pub fn is_start_uri(&self, uri: &Url) -> bool {
        if uri.fragment().is_some() {
            strip_fragment(uri.clone()) == self.start_uri
        } else {
            *uri == self.start_uri
        }
    }
}
