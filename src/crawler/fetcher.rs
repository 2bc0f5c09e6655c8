//! HTTP verification and rendering
//!
//! This module handles all HTTP requests made during a crawl:
//! - Building the shared HTTP client with the crawler's user agent
//! - Verifying resources (final URI after redirects, status, size, type)
//! - Fetching the markup of internal HTML pages
//!
//! Redirects are followed by the client. Markup is taken as served, no
//! script is executed.

use crate::config::UserAgentConfig;
use crate::crawler::{HtmlDocument, Renderer, Verifier};
use crate::model::{Resource, ResourceType, StatusCode};
use crate::LinkscoutError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Longest redirect chain followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Timeout applied to every request
///
/// # Example
///
/// ```no_run
/// use linkscout::config::UserAgentConfig;
/// use linkscout::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version
    let user_agent = format!("{}/{}", config.crawler_name, config.crawler_version);

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(30)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Verifies resources with a GET request
pub struct HttpVerifier {
    client: Client,
}

impl HttpVerifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Verifier for HttpVerifier {
    /// # Status mapping
    ///
    /// | Outcome | Result |
    /// |---------|--------|
    /// | Any HTTP response | `Ok`, status set to the response code |
    /// | Timeout | `Ok`, status set to 408 |
    /// | Connection, DNS or redirect error | `Ok`, status set to `Unreachable` |
    /// | Request could not be built | `Err(LinkscoutError::Http)` |
    async fn verify(&self, resource: &mut Resource) -> crate::Result<()> {
        let uri = absolute_uri(resource)?;

        let response = match self.client.get(uri.clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::debug!(url = %uri, "Verification timed out");
                resource.status_code = StatusCode::Http(408);
                return Ok(());
            }
            Err(e) if e.is_builder() => {
                return Err(LinkscoutError::Http {
                    url: uri.to_string(),
                    source: e,
                })
            }
            Err(e) => {
                tracing::debug!(url = %uri, "No response: {}", e);
                resource.status_code = StatusCode::Unreachable;
                return Ok(());
            }
        };

        resource.set_uri(response.url().clone());
        resource.status_code = StatusCode::from(response.status().as_u16());
        resource.resource_type = resource_type(&response);

        resource.size = match response.content_length() {
            Some(length) => Some(length),
            // Compressed or chunked bodies carry no usable length header
            None => response.bytes().await.ok().map(|body| body.len() as u64),
        };

        tracing::trace!(
            url = %uri,
            status = resource.status_code.as_i32(),
            "Resource verified"
        );
        Ok(())
    }
}

/// Renders pages by fetching their markup
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, resource: &Resource) -> crate::Result<HtmlDocument> {
        let uri = absolute_uri(resource)?;

        let response = self
            .client
            .get(uri.clone())
            .send()
            .await
            .map_err(|e| classify_error(&uri, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkscoutError::Render {
                url: uri.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_uri = response.url().clone();
        let text = response
            .text()
            .await
            .map_err(|e| classify_error(&uri, e))?;

        Ok(HtmlDocument {
            uri: final_uri,
            text,
        })
    }
}

fn absolute_uri(resource: &Resource) -> crate::Result<Url> {
    resource
        .uri()
        .cloned()
        .ok_or_else(|| LinkscoutError::MissingUri(resource.original_url().to_string()))
}

fn resource_type(response: &Response) -> ResourceType {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ResourceType::from_content_type)
        .unwrap_or_default()
}

fn classify_error(uri: &Url, error: reqwest::Error) -> LinkscoutError {
    if error.is_timeout() {
        LinkscoutError::Timeout {
            url: uri.to_string(),
        }
    } else {
        LinkscoutError::Http {
            url: uri.to_string(),
            source: error,
        }
    }
}
