//! Bounded work queues connecting the pipeline stages
//!
//! Three independent FIFO queues hold the work of each stage:
//! - to-verify: resources waiting for verification
//! - to-render: internal HTML resources waiting to be rendered
//! - to-extract: rendered documents waiting for link extraction
//!
//! `memorize_*` waits while a queue is full, `take_*` waits while it is
//! empty. Both give up with `MemoryError::Cancelled` as soon as the shared
//! cancellation token fires. Admission is gated by the crawler state machine.

use crate::model::Resource;
use crate::state::{crawler_state_machine, CrawlerCommand, CrawlerState, StateMachine};
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Default capacity of every work queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Errors returned by queue operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Queue [{0}] is closed")]
    Closed(&'static str),

    #[error("Work is not accepted while the crawler is {0:?}")]
    NotAccepting(CrawlerState),
}

/// Rendered markup of a page
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlDocument {
    /// URI the markup was served from, after redirects
    pub uri: Url,
    pub text: String,
}

/// A resource together with its rendered document
#[derive(Debug, Clone)]
pub struct RenderedResource {
    pub resource: Resource,
    pub document: HtmlDocument,
}

/// One bounded FIFO queue, shared by any number of producers and consumers
struct WorkQueue<T> {
    name: &'static str,
    sender: mpsc::Sender<T>,
    receiver: Mutex<mpsc::Receiver<T>>,
}

impl<T> WorkQueue<T> {
    fn new(name: &'static str, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            name,
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    async fn push(&self, item: T, cancellation: &CancellationToken) -> Result<(), MemoryError> {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(MemoryError::Cancelled),
            sent = self.sender.send(item) => sent.map_err(|_| MemoryError::Closed(self.name)),
        }
    }

    async fn pop(&self, cancellation: &CancellationToken) -> Result<T, MemoryError> {
        let mut receiver = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(MemoryError::Cancelled),
            receiver = self.receiver.lock() => receiver,
        };

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(MemoryError::Cancelled),
            item = receiver.recv() => item.ok_or(MemoryError::Closed(self.name)),
        }
    }

    fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The work queues of one crawl plus their admission gate
pub struct Memory {
    to_be_verified: WorkQueue<Resource>,
    to_be_rendered: WorkQueue<Resource>,
    to_be_extracted: WorkQueue<RenderedResource>,
    state_machine: StateMachine<CrawlerState, CrawlerCommand>,
    state_watch: watch::Sender<CrawlerState>,
    cancellation: CancellationToken,
}

impl Memory {
    /// Creates the three queues, each holding at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects it.
    pub fn new(capacity: usize) -> Self {
        let (state_watch, _) = watch::channel(CrawlerState::Ready);
        Self {
            to_be_verified: WorkQueue::new("to-verify", capacity),
            to_be_rendered: WorkQueue::new("to-render", capacity),
            to_be_extracted: WorkQueue::new("to-extract", capacity),
            state_machine: crawler_state_machine(),
            state_watch,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn crawler_state(&self) -> CrawlerState {
        self.state_machine.current_state()
    }

    /// Attempts a crawler state transition
    pub fn try_transit(&self, command: CrawlerCommand) -> bool {
        self.state_machine.try_transit_next_with(command, |transit| {
            self.state_watch.send_replace(transit.state());
        })
    }

    /// Token shared by every blocking queue operation
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Unblocks every pending and future queue operation
    pub fn cancel_everything(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// True iff all three queues are empty at the time of each check
    pub fn nothing_left_to_do(&self) -> bool {
        self.to_be_verified.is_empty()
            && self.to_be_rendered.is_empty()
            && self.to_be_extracted.is_empty()
    }

    /// Number of resources waiting for verification
    pub fn remaining_url_count(&self) -> usize {
        self.to_be_verified.len()
    }

    pub async fn memorize_to_be_verified(&self, resource: Resource) -> Result<(), MemoryError> {
        self.ensure_admission()?;
        self.to_be_verified.push(resource, &self.cancellation).await
    }

    pub async fn memorize_to_be_rendered(&self, resource: Resource) -> Result<(), MemoryError> {
        self.ensure_admission()?;
        self.to_be_rendered.push(resource, &self.cancellation).await
    }

    pub async fn memorize_to_be_extracted(
        &self,
        rendered: RenderedResource,
    ) -> Result<(), MemoryError> {
        self.ensure_admission()?;
        self.to_be_extracted.push(rendered, &self.cancellation).await
    }

    pub async fn take_to_be_verified(&self) -> Result<Resource, MemoryError> {
        self.wait_while_paused().await?;
        self.to_be_verified.pop(&self.cancellation).await
    }

    pub async fn take_to_be_rendered(&self) -> Result<Resource, MemoryError> {
        self.wait_while_paused().await?;
        self.to_be_rendered.pop(&self.cancellation).await
    }

    pub async fn take_to_be_extracted(&self) -> Result<RenderedResource, MemoryError> {
        self.wait_while_paused().await?;
        self.to_be_extracted.pop(&self.cancellation).await
    }

    fn ensure_admission(&self) -> Result<(), MemoryError> {
        let state = self.crawler_state();
        if state.admits_work() {
            Ok(())
        } else {
            Err(MemoryError::NotAccepting(state))
        }
    }

    async fn wait_while_paused(&self) -> Result<(), MemoryError> {
        let mut state = self.state_watch.subscribe();
        loop {
            let paused = *state.borrow_and_update() == CrawlerState::Paused;
            if !paused {
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => return Err(MemoryError::Cancelled),
                changed = state.changed() => {
                    if changed.is_err() {
                        return Err(MemoryError::Closed("crawler-state"));
                    }
                }
            }
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn resource(id: u64, url: &str) -> Resource {
        Resource::new(id, url, None, false)
    }

    fn working_memory(capacity: usize) -> Memory {
        let memory = Memory::new(capacity);
        assert!(memory.try_transit(CrawlerCommand::Start));
        memory
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let memory = working_memory(4);
        memory
            .memorize_to_be_verified(resource(1, "http://example.com/a"))
            .await
            .unwrap();
        memory
            .memorize_to_be_verified(resource(2, "http://example.com/b"))
            .await
            .unwrap();

        assert_eq!(memory.remaining_url_count(), 2);
        assert_eq!(memory.take_to_be_verified().await.unwrap().id(), 1);
        assert_eq!(memory.take_to_be_verified().await.unwrap().id(), 2);
        assert!(memory.nothing_left_to_do());
    }

    #[tokio::test]
    async fn test_admission_requires_working_state() {
        let memory = Memory::new(4);
        let result = memory
            .memorize_to_be_verified(resource(1, "http://example.com/"))
            .await;
        assert_eq!(result, Err(MemoryError::NotAccepting(CrawlerState::Ready)));
    }

    #[tokio::test]
    async fn test_full_queue_blocks_until_taken() {
        let memory = Arc::new(working_memory(1));
        memory
            .memorize_to_be_rendered(resource(1, "http://example.com/a"))
            .await
            .unwrap();

        let blocked = timeout(
            Duration::from_millis(50),
            memory.memorize_to_be_rendered(resource(2, "http://example.com/b")),
        )
        .await;
        assert!(blocked.is_err(), "memorize should wait while the queue is full");

        let producer = {
            let memory = Arc::clone(&memory);
            tokio::spawn(async move {
                memory
                    .memorize_to_be_rendered(resource(3, "http://example.com/c"))
                    .await
            })
        };
        assert_eq!(memory.take_to_be_rendered().await.unwrap().id(), 1);
        producer.await.unwrap().unwrap();
        assert_eq!(memory.take_to_be_rendered().await.unwrap().id(), 3);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_take() {
        let memory = Arc::new(working_memory(4));
        let consumer = {
            let memory = Arc::clone(&memory);
            tokio::spawn(async move { memory.take_to_be_verified().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        memory.cancel_everything();

        let result = timeout(Duration::from_secs(1), consumer).await.unwrap().unwrap();
        assert_eq!(result.unwrap_err(), MemoryError::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_memorize() {
        let memory = Arc::new(working_memory(1));
        memory
            .memorize_to_be_verified(resource(1, "http://example.com/a"))
            .await
            .unwrap();

        let producer = {
            let memory = Arc::clone(&memory);
            tokio::spawn(async move {
                memory
                    .memorize_to_be_verified(resource(2, "http://example.com/b"))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        memory.cancel_everything();

        let result = timeout(Duration::from_secs(1), producer).await.unwrap().unwrap();
        assert_eq!(result, Err(MemoryError::Cancelled));
        assert!(memory.is_cancelled());
    }

    #[tokio::test]
    async fn test_take_waits_while_paused() {
        let memory = Arc::new(working_memory(4));
        memory
            .memorize_to_be_verified(resource(1, "http://example.com/a"))
            .await
            .unwrap();
        assert!(memory.try_transit(CrawlerCommand::Pause));

        let paused_take = timeout(Duration::from_millis(50), memory.take_to_be_verified()).await;
        assert!(paused_take.is_err(), "take should wait while paused");

        let consumer = {
            let memory = Arc::clone(&memory);
            tokio::spawn(async move { memory.take_to_be_verified().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(memory.try_transit(CrawlerCommand::Resume));

        let taken = timeout(Duration::from_secs(1), consumer).await.unwrap().unwrap();
        assert_eq!(taken.unwrap().id(), 1);
    }

    #[tokio::test]
    async fn test_nothing_left_to_do_checks_every_queue() {
        let memory = working_memory(4);
        assert!(memory.nothing_left_to_do());

        let document = HtmlDocument {
            uri: Url::parse("http://example.com/").unwrap(),
            text: "<html></html>".to_string(),
        };
        memory
            .memorize_to_be_extracted(RenderedResource {
                resource: resource(1, "http://example.com/"),
                document,
            })
            .await
            .unwrap();
        assert!(!memory.nothing_left_to_do());
        assert_eq!(memory.remaining_url_count(), 0);

        memory.take_to_be_extracted().await.unwrap();
        assert!(memory.nothing_left_to_do());
    }

    #[test]
    fn test_state_transitions() {
        let memory = Memory::default();
        assert_eq!(memory.crawler_state(), CrawlerState::Ready);
        assert!(!memory.try_transit(CrawlerCommand::Stop));
        assert!(memory.try_transit(CrawlerCommand::Start));
        assert!(memory.try_transit(CrawlerCommand::Stop));
        assert!(memory.try_transit(CrawlerCommand::Reset));
        assert_eq!(memory.crawler_state(), CrawlerState::Ready);
    }
}
