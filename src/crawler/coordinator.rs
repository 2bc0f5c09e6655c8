//! Crawler coordinator - the single serialization point of a crawl
//!
//! Every processing result flows through [`Coordinator::process`], one at a
//! time. That step owns:
//! - deduplication of newly discovered resources
//! - workload accounting (one increment per admitted resource, one
//!   decrement per processed result)
//! - completion detection, when the workload drops to zero
//! - the ordered event stream consumed by the bot
//!
//! Results are posted on an unbounded channel so that workers never block
//! on the coordinator. The resources it outputs are memorized for
//! verification.

use crate::crawler::{IdGenerator, Memory, ProcessedUrlRegister, Statistics};
use crate::model::{Event, ProcessingResult, Resource};
use crate::state::{
    log_transition_failure, workflow_state_machine, StateMachine, WorkflowCommand, WorkflowState,
};
use crate::url::ResourceScope;
use crate::LinkscoutError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Coordinates discovery, accounting and completion of one workflow
pub struct Coordinator {
    state_machine: StateMachine<WorkflowState, WorkflowCommand>,
    register: Arc<ProcessedUrlRegister>,
    statistics: Arc<Statistics>,
    scope: ResourceScope,
    id_generator: Arc<IdGenerator>,
    input_tx: Mutex<Option<UnboundedSender<ProcessingResult>>>,
    input_rx: Mutex<Option<UnboundedReceiver<ProcessingResult>>>,
    events_tx: Mutex<Option<UnboundedSender<Event>>>,
    events_rx: Mutex<Option<UnboundedReceiver<Event>>>,
    cancellation: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    unregistered_resource_count: AtomicU64,
}

impl Coordinator {
    pub fn new(
        register: Arc<ProcessedUrlRegister>,
        statistics: Arc<Statistics>,
        scope: ResourceScope,
        id_generator: Arc<IdGenerator>,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            state_machine: workflow_state_machine(),
            register,
            statistics,
            scope,
            id_generator,
            input_tx: Mutex::new(Some(input_tx)),
            input_rx: Mutex::new(Some(input_rx)),
            events_tx: Mutex::new(Some(events_tx)),
            events_rx: Mutex::new(Some(events_rx)),
            cancellation: CancellationToken::new(),
            task: Mutex::new(None),
            unregistered_resource_count: AtomicU64::new(0),
        }
    }

    pub fn workflow_state(&self) -> WorkflowState {
        self.state_machine.current_state()
    }

    /// Takes the ordered event stream; only the first call gets it
    pub fn take_events(&self) -> Option<UnboundedReceiver<Event>> {
        lock(&self.events_rx).take()
    }

    /// Number of processed resources that were never registered
    ///
    /// Such resources are still processed. A non-zero count points at a
    /// result that bypassed discovery.
    ///
    /// The check looks up the URI a resource was registered under, not the
    /// one it ended at: a followed redirect changes the latter, and checking
    /// it would flag every redirected link.
    pub fn unregistered_resource_count(&self) -> u64 {
        self.unregistered_resource_count.load(Ordering::Relaxed)
    }

    /// Queues a processing result; never blocks
    pub fn post(&self, result: ProcessingResult) -> crate::Result<()> {
        let sender = lock(&self.input_tx);
        let sender = sender.as_ref().ok_or(LinkscoutError::CoordinatorClosed)?;
        sender
            .send(result)
            .map_err(|_| LinkscoutError::CoordinatorClosed)
    }

    /// Seeds the workflow with its start URL
    ///
    /// Succeeds at most once. A seed that cannot be posted is rolled back:
    /// the workload is restored and the workflow goes back to waiting for
    /// activation.
    pub fn try_activate_workflow(&self, start_url: &str) -> bool {
        let mut activated = false;
        let transited = self
            .state_machine
            .try_transit_next_with(WorkflowCommand::Activate, |transit| {
                self.statistics.increment_remaining_workload();

                let seed = Resource::new(self.id_generator.next_id(), start_url, None, false)
                    .internal();
                let seed_result = ProcessingResult::Successful {
                    processed_resource: None,
                    new_resources: vec![seed],
                };

                match self.post(seed_result) {
                    Ok(()) => activated = true,
                    Err(e) => {
                        error!(start_url, "Failed to activate workflow: {}", e);
                        if let Err(e) = self.statistics.decrement_remaining_workload() {
                            error!("Failed to roll back workload: {}", e);
                        }
                        if !transit.try_transit_next(WorkflowCommand::Deactivate) {
                            log_transition_failure(transit.state(), WorkflowCommand::Deactivate);
                        }
                    }
                }
            });

        if !transited {
            log_transition_failure(self.workflow_state(), WorkflowCommand::Activate);
        }

        activated
    }

    /// Spawns the loop that processes posted results
    ///
    /// Output resources are memorized for verification.
    pub fn start(self: &Arc<Self>, memory: Arc<Memory>) -> crate::Result<()> {
        let input = lock(&self.input_rx)
            .take()
            .ok_or(LinkscoutError::CoordinatorClosed)?;

        let coordinator = Arc::clone(self);
        let handle = tokio::spawn(async move { coordinator.run(input, memory).await });
        *lock(&self.task) = Some(handle);
        Ok(())
    }

    /// Stops accepting results, waits for the loop and closes the event stream
    ///
    /// Results still buffered when the loop stops are discarded.
    pub async fn complete(&self) -> crate::Result<()> {
        lock(&self.input_tx).take();
        self.cancellation.cancel();

        let handle = lock(&self.task).take();
        if let Some(handle) = handle {
            handle.await?;
        }

        lock(&self.events_tx).take();
        debug!("Coordinator completed");
        Ok(())
    }

    /// Processes one result and returns the resources to verify next
    ///
    /// Errors are logged and turn into an empty output.
    pub fn process(&self, result: ProcessingResult) -> Vec<Resource> {
        match self.try_process(result) {
            Ok(resources) => resources,
            Err(e) => {
                error!("Error while coordinating: {}", e);
                Vec::new()
            }
        }
    }

    fn try_process(&self, result: ProcessingResult) -> crate::Result<Vec<Resource>> {
        if let Some(processed) = result.processed_resource() {
            let at_start_uri = processed
                .original_uri()
                .is_some_and(|uri| self.scope.is_start_uri(uri));

            if at_start_uri && processed.redirected() {
                let final_url = processed.uri().map(Url::to_string).unwrap_or_default();
                warn!(final_url = %final_url, "Redirect happened at start URL");
                self.send_out(Event::RedirectHappenedAtStartUrl { final_url });
                return Ok(Vec::new());
            }

            if !self.register.is_registered(processed.dedup_key()) {
                self.unregistered_resource_count
                    .fetch_add(1, Ordering::Relaxed);
                error!(
                    id = processed.id(),
                    url = processed.dedup_key(),
                    "Processed resource was never registered"
                );
            }

            if processed.status_code.is_broken() {
                warn!(
                    url = processed.dedup_key(),
                    status = %processed.status_code,
                    parent = processed.parent_uri().map(Url::as_str).unwrap_or("-"),
                    "Broken link"
                );
                self.send_out(Event::broken_link(processed));
            }
        }

        let new_resources: Vec<Resource> = result
            .into_new_resources()
            .into_iter()
            .filter(|resource| {
                let admitted = self.register.try_register(resource.dedup_key());
                if admitted {
                    self.statistics.increment_remaining_workload();
                }
                admitted
            })
            .collect();

        self.statistics.decrement_remaining_workload()?;

        let remaining_workload = self.statistics.take_snapshot().remaining_workload;
        trace!(
            remaining_workload,
            discovered = new_resources.len(),
            "Resource processed"
        );
        self.send_out(Event::ResourceProcessed { remaining_workload });
        if remaining_workload > 0 {
            return Ok(new_resources);
        }

        info!("No more work to do");
        self.send_out(Event::NoMoreWorkToDo);
        Ok(Vec::new())
    }

    async fn run(&self, mut input: UnboundedReceiver<ProcessingResult>, memory: Arc<Memory>) {
        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => break,
                received = input.recv() => match received {
                    Some(result) => result,
                    None => break,
                },
            };

            for resource in self.process(result) {
                if let Err(e) = memory.memorize_to_be_verified(resource).await {
                    debug!("Dropped resource instead of verifying it: {}", e);
                }
            }
        }

        input.close();
        let mut discarded = 0usize;
        while input.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "Discarded buffered processing results");
        }
    }

    fn send_out(&self, event: Event) {
        let sender = lock(&self.events_tx);
        // The stream is closed once completed; late events are dropped.
        if let Some(sender) = sender.as_ref() {
            if sender.send(event).is_err() {
                error!("Failed to post event: the event stream has no reader");
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
