use crate::config::types::{Config, CrawlConfig, PipelineConfig, UserAgentConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use linkscout::config::load_config;
///
/// let config = load_config(Path::new("linkscout.toml")).unwrap();
/// println!("Start URI: {}", config.crawl.start_uri);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(content)?;
    normalize_remote_host(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is logged at startup so a crawl can be correlated with the exact
/// configuration that produced it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

impl Config {
    /// Builds a validated configuration with default pipeline settings
    ///
    /// # Example
    ///
    /// ```
    /// use linkscout::Config;
    ///
    /// let config = Config::for_start_url("http://example.com").unwrap();
    /// assert_eq!(config.pipeline.queue_capacity, 1000);
    ///
    /// assert!(Config::for_start_url("ftp://example.com").is_err());
    /// ```
    pub fn for_start_url(start_url: &str) -> Result<Config, ConfigError> {
        let config = Config {
            crawl: CrawlConfig {
                start_uri: start_url.to_string(),
                remote_host: None,
            },
            pipeline: PipelineConfig::default(),
            user_agent: UserAgentConfig::default(),
        };
        validate(&config)?;
        Ok(config)
    }
}

/// Lowercases the remote host and maps an empty one to none
fn normalize_remote_host(config: &mut Config) {
    config.crawl.remote_host = config
        .crawl
        .remote_host
        .take()
        .map(|host| host.trim().to_lowercase())
        .filter(|host| !host.is_empty());
}
