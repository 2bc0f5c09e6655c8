//! Worker pools of the verification, rendering and extraction stages
//!
//! Each stage is a fixed number of workers taking from one queue of
//! [`Memory`]. Results go back to the [`Coordinator`], which feeds newly
//! discovered resources into the to-verify queue:
//!
//! ```text
//! to-verify -> verification -+-> to-render -> rendering -> to-extract -> extraction
//!                            |                    |                          |
//!                            +--------------------+--------------------------+--> coordinator
//! ```
//!
//! Workers stop on cancellation, abandoning the item in hand.

use crate::config::PipelineConfig;
use crate::crawler::{Collaborators, Coordinator, Memory, RenderedResource, Statistics};
use crate::model::{ProcessingResult, Resource, ResourceType};
use crate::url::ResourceScope;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Everything the stage workers share
pub struct StageContext {
    pub memory: Arc<Memory>,
    pub coordinator: Arc<Coordinator>,
    pub statistics: Arc<Statistics>,
    pub scope: ResourceScope,
    pub collaborators: Collaborators,
}

/// Running worker pools
pub struct Pipeline {
    workers: JoinSet<()>,
}

impl Pipeline {
    /// Spawns the worker pools sized by `config`
    pub fn start(config: &PipelineConfig, context: StageContext) -> Self {
        let context = Arc::new(context);
        let mut workers = JoinSet::new();

        for _ in 0..config.max_verifier_count {
            workers.spawn(verification_worker(Arc::clone(&context)));
        }
        for _ in 0..config.max_renderer_count {
            workers.spawn(rendering_worker(Arc::clone(&context)));
        }
        for _ in 0..config.max_extractor_count {
            workers.spawn(extraction_worker(Arc::clone(&context)));
        }

        debug!(
            verifiers = config.max_verifier_count,
            renderers = config.max_renderer_count,
            extractors = config.max_extractor_count,
            "Pipeline started"
        );
        Self { workers }
    }

    /// Waits for every worker to stop
    ///
    /// Workers only stop once the memory has been cancelled, so cancel it
    /// first.
    pub async fn shutdown(mut self) -> crate::Result<()> {
        let mut failure = None;
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                error!("Pipeline worker failed: {}", e);
                failure.get_or_insert(e);
            }
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

async fn verification_worker(context: Arc<StageContext>) {
    let cancellation = context.memory.cancellation_token();
    loop {
        let resource = match context.memory.take_to_be_verified().await {
            Ok(resource) => resource,
            Err(e) => {
                debug!("Verification worker stopping: {}", e);
                break;
            }
        };

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => break,
            _ = context.verify(resource) => {}
        }
    }
}

async fn rendering_worker(context: Arc<StageContext>) {
    let cancellation = context.memory.cancellation_token();
    loop {
        let resource = match context.memory.take_to_be_rendered().await {
            Ok(resource) => resource,
            Err(e) => {
                debug!("Rendering worker stopping: {}", e);
                break;
            }
        };

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => break,
            _ = context.render(resource) => {}
        }
    }
}

async fn extraction_worker(context: Arc<StageContext>) {
    loop {
        match context.memory.take_to_be_extracted().await {
            Ok(rendered) => context.extract(rendered),
            Err(e) => {
                debug!("Extraction worker stopping: {}", e);
                break;
            }
        }
    }
}

impl StageContext {
    async fn verify(&self, mut resource: Resource) {
        // Unparsable URLs never reach the verifier
        if resource.status_code.is_parse_error() {
            if resource.status_code.is_broken() {
                self.statistics.record_verification(&resource);
            }
            self.post(ProcessingResult::Failed {
                processed_resource: resource,
            });
            return;
        }

        if !resource.is_internal {
            resource.is_internal = resource
                .uri()
                .is_some_and(|uri| self.scope.is_internal(uri));
        }

        if let Err(e) = self.collaborators.verifier.verify(&mut resource).await {
            warn!(url = resource.dedup_key(), "Failed to verify resource: {}", e);
            self.post(ProcessingResult::Failed {
                processed_resource: resource,
            });
            return;
        }
        self.statistics.record_verification(&resource);

        if self.should_render(&resource) {
            if let Err(e) = self.memory.memorize_to_be_rendered(resource).await {
                debug!("Dropped resource instead of rendering it: {}", e);
            }
        } else {
            self.post(ProcessingResult::processed(resource));
        }
    }

    async fn render(&self, resource: Resource) {
        match self.collaborators.renderer.render(&resource).await {
            Ok(document) => {
                let rendered = RenderedResource { resource, document };
                if let Err(e) = self.memory.memorize_to_be_extracted(rendered).await {
                    debug!("Dropped rendered resource instead of extracting it: {}", e);
                }
            }
            Err(e) => {
                warn!(url = resource.dedup_key(), "Failed to render resource: {}", e);
                self.post(ProcessingResult::Failed {
                    processed_resource: resource,
                });
            }
        }
    }

    fn extract(&self, rendered: RenderedResource) {
        let RenderedResource { resource, document } = rendered;
        let new_resources = self.collaborators.extractor.extract(&document);
        debug!(
            url = %document.uri,
            found = new_resources.len(),
            "Extracted links"
        );

        self.post(ProcessingResult::Successful {
            processed_resource: Some(resource),
            new_resources,
        });
    }

    /// Internal healthy HTML pages are rendered for their links
    ///
    /// A page redirected off-site is not.
    fn should_render(&self, resource: &Resource) -> bool {
        resource.is_internal
            && resource.resource_type == ResourceType::Html
            && !resource.status_code.is_broken()
            && resource
                .uri()
                .is_some_and(|uri| self.scope.is_internal(uri))
    }

    fn post(&self, result: ProcessingResult) {
        if let Err(e) = self.coordinator.post(result) {
            debug!("Dropped processing result: {}", e);
        }
    }
}
