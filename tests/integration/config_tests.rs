//! Integration tests for configuration files

use linkscout::config::{compute_config_hash, load_config, load_config_with_hash};
use linkscout::ConfigError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
[crawl]
start-uri = "https://staging.example.com/docs/"
remote-host = "WWW.Example.com"

[pipeline]
queue-capacity = 50
max-verifier-count = 8
max-renderer-count = 2
max-extractor-count = 1
http-request-timeout-secs = 30
progress-report-interval-ms = 500

[user-agent]
crawler-name = "DocsChecker"
crawler-version = "2.1"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.crawl.start_uri, "https://staging.example.com/docs/");
    assert_eq!(config.crawl.remote_host.as_deref(), Some("www.example.com"));
    assert_eq!(config.pipeline.queue_capacity, 50);
    assert_eq!(config.pipeline.max_verifier_count, 8);
    assert_eq!(config.pipeline.progress_report_interval_ms, 500);
    assert_eq!(config.user_agent.crawler_name, "DocsChecker");
}

#[test]
fn test_unsupported_scheme_fails_fast() {
    let file = write_config(
        r#"
[crawl]
start-uri = "ftp://example.com/"
"#,
    );

    let result = load_config(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedScheme(scheme)) if scheme == "ftp"));
}

#[test]
fn test_missing_start_uri() {
    let file = write_config("[crawl]\n");
    assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
}

#[test]
fn test_hash_is_stable() {
    let content = "[crawl]\nstart-uri = \"http://example.com\"\n";
    let first = write_config(content);
    let second = write_config(content);

    let (_, hash) = load_config_with_hash(first.path()).unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, compute_config_hash(second.path()).unwrap());
}
