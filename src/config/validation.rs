use crate::config::types::{Config, CrawlConfig, PipelineConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Largest worker pool any stage may ask for
const MAX_WORKER_COUNT: usize = 300;

/// Largest capacity a single work queue may ask for
const MAX_QUEUE_CAPACITY: usize = 100_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates the start URI and the optional remote host
///
/// The start URI must be absolute and use `http` or `https`; anything else
/// fails fast with `ConfigError::UnsupportedScheme`.
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let start_uri = Url::parse(&config.start_uri).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start-uri '{}': {}", config.start_uri, e))
    })?;

    let scheme = start_uri.scheme().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::UnsupportedScheme(scheme));
    }

    if start_uri.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "start-uri '{}' has no host",
            config.start_uri
        )));
    }

    if let Some(remote_host) = &config.remote_host {
        validate_host(remote_host)?;
    }

    Ok(())
}

/// Validates pipeline sizing
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.queue_capacity < 1 || config.queue_capacity > MAX_QUEUE_CAPACITY {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be between 1 and {}, got {}",
            MAX_QUEUE_CAPACITY, config.queue_capacity
        )));
    }

    for (name, count) in [
        ("max_verifier_count", config.max_verifier_count),
        ("max_renderer_count", config.max_renderer_count),
        ("max_extractor_count", config.max_extractor_count),
    ] {
        if count < 1 || count > MAX_WORKER_COUNT {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_WORKER_COUNT, count
            )));
        }
    }

    if config.http_request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "http_request_timeout_secs must be >= 1, got {}",
            config.http_request_timeout_secs
        )));
    }

    if config.progress_report_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "progress_report_interval_ms must be >= 100ms, got {}ms",
            config.progress_report_interval_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a bare host name (no scheme, port or path)
fn validate_host(host: &str) -> Result<(), ConfigError> {
    // An empty remote host means "none"
    if host.is_empty() {
        return Ok(());
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "remote-host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "remote-host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::Validation(format!(
            "remote-host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}
