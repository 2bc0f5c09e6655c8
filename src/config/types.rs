use serde::Deserialize;

/// Main configuration structure for Linkscout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// What to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Absolute http/https URL the crawl starts from
    #[serde(rename = "start-uri")]
    pub start_uri: String,

    /// Host the site is published under when crawling a staging copy.
    /// Resources on this host are treated as internal.
    #[serde(rename = "remote-host", default)]
    pub remote_host: Option<String>,
}

/// Sizing of the work queues and worker pools
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Capacity of each bounded work queue
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of concurrent verification workers
    #[serde(rename = "max-verifier-count", default = "default_max_verifier_count")]
    pub max_verifier_count: usize,

    /// Number of concurrent rendering workers
    #[serde(rename = "max-renderer-count", default = "default_max_renderer_count")]
    pub max_renderer_count: usize,

    /// Number of concurrent extraction workers
    #[serde(rename = "max-extractor-count", default = "default_max_extractor_count")]
    pub max_extractor_count: usize,

    /// Timeout applied to every HTTP request (seconds)
    #[serde(
        rename = "http-request-timeout-secs",
        default = "default_http_request_timeout_secs"
    )]
    pub http_request_timeout_secs: u64,

    /// Interval between two working progress reports (milliseconds)
    #[serde(
        rename = "progress-report-interval-ms",
        default = "default_progress_report_interval_ms"
    )]
    pub progress_report_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_verifier_count: default_max_verifier_count(),
            max_renderer_count: default_max_renderer_count(),
            max_extractor_count: default_max_extractor_count(),
            http_request_timeout_secs: default_http_request_timeout_secs(),
            progress_report_interval_ms: default_progress_report_interval_ms(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_max_verifier_count() -> usize {
    32
}

fn default_max_renderer_count() -> usize {
    10
}

fn default_max_extractor_count() -> usize {
    4
}

fn default_http_request_timeout_secs() -> u64 {
    180
}

fn default_progress_report_interval_ms() -> u64 {
    1000
}

fn default_crawler_name() -> String {
    "Linkscout".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
