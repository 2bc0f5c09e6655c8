//! Seams between the coordination engine and the work it delegates
//!
//! The engine never talks to the network or parses markup itself. A crawl is
//! wired with one [`Verifier`], one [`Renderer`] and one [`Extractor`]; the
//! HTTP-backed defaults live in `fetcher` and `parser`.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, HttpRenderer, HttpVerifier};
use crate::crawler::parser::AnchorExtractor;
use crate::crawler::{HtmlDocument, IdGenerator};
use crate::model::Resource;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Checks that a resource is reachable
///
/// Implementations update `uri` after redirects, and fill in
/// `status_code`, `size` and `resource_type`.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, resource: &mut Resource) -> crate::Result<()>;
}

/// Produces the markup of an internal HTML resource
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, resource: &Resource) -> crate::Result<HtmlDocument>;
}

/// Finds the resources a document links to
pub trait Extractor: Send + Sync {
    fn extract(&self, document: &HtmlDocument) -> Vec<Resource>;
}

/// The set of collaborators one crawl runs with
#[derive(Clone)]
pub struct Collaborators {
    pub verifier: Arc<dyn Verifier>,
    pub renderer: Arc<dyn Renderer>,
    pub extractor: Arc<dyn Extractor>,
}

impl Collaborators {
    /// HTTP verification and rendering, anchor-based extraction
    pub fn http(config: &Config, id_generator: Arc<IdGenerator>) -> crate::Result<Self> {
        let timeout = Duration::from_secs(config.pipeline.http_request_timeout_secs);
        let client = build_http_client(&config.user_agent, timeout)?;

        Ok(Self {
            verifier: Arc::new(HttpVerifier::new(client.clone())),
            renderer: Arc::new(HttpRenderer::new(client)),
            extractor: Arc::new(AnchorExtractor::new(id_generator)),
        })
    }
}
