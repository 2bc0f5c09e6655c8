//! Crawl session
//!
//! A [`Bot`] wires the coordination engine together for one crawl, drives
//! its lifecycle and broadcasts every event to its subscribers, in
//! registration order.
//!
//! # Lifecycle
//!
//! ```text
//! WaitingForInitialization -> WaitingToRun -> Running <-> Paused
//!                                  |             |          |
//!                            WaitingForStop ----------> Completed -> RanToCompletion
//!                                                                 -> Cancelled
//!                                                                 -> Faulted
//! ```

use crate::config::validation::validate;
use crate::config::Config;
use crate::crawler::{
    Collaborators, Coordinator, IdGenerator, Memory, Pipeline, ProcessedUrlRegister,
    StageContext, Statistics, StatisticsSnapshot,
};
use crate::model::Event;
use crate::state::{
    bot_state_machine, log_transition_failure, BotCommand, BotState, CrawlerCommand, StateMachine,
};
use crate::url::ResourceScope;
use crate::LinkscoutError;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

type Subscriber = Box<dyn Fn(&Event) + Send + Sync>;

/// Services that only exist while a crawl is running
struct Services {
    memory: Arc<Memory>,
    statistics: Arc<Statistics>,
    coordinator: Arc<Coordinator>,
    pipeline: Pipeline,
    forwarder: Option<JoinHandle<()>>,
    reporter: JoinHandle<()>,
}

impl Services {
    /// Stops every background task, in pipeline order
    async fn shutdown(self) -> crate::Result<()> {
        if !self.memory.try_transit(CrawlerCommand::Stop) {
            log_transition_failure(self.memory.crawler_state(), CrawlerCommand::Stop);
        }
        self.memory.cancel_everything();

        let pipeline = self.pipeline.shutdown().await;
        let coordinator = self.coordinator.complete().await;
        let forwarder = match self.forwarder {
            Some(forwarder) => forwarder.await.map_err(LinkscoutError::from),
            None => Ok(()),
        };
        let reporter = self.reporter.await.map_err(LinkscoutError::from);

        if !self.memory.try_transit(CrawlerCommand::Reset) {
            log_transition_failure(self.memory.crawler_state(), CrawlerCommand::Reset);
        }

        pipeline.and(coordinator).and(forwarder).and(reporter)
    }
}

/// One crawl session
pub struct Bot {
    state_machine: StateMachine<BotState, BotCommand>,
    collaborators: Collaborators,
    id_generator: Arc<IdGenerator>,
    subscribers: Mutex<Vec<Subscriber>>,
    services: Mutex<Option<Services>>,
    completion: watch::Sender<Option<BotState>>,
}

impl Bot {
    /// Creates a bot that will crawl with the given collaborators
    ///
    /// `id_generator` must be the one the extractor assigns ids from.
    pub fn new(collaborators: Collaborators, id_generator: Arc<IdGenerator>) -> Self {
        let (completion, _) = watch::channel(None);
        Self {
            state_machine: bot_state_machine(),
            collaborators,
            id_generator,
            subscribers: Mutex::new(Vec::new()),
            services: Mutex::new(None),
            completion,
        }
    }

    pub fn state(&self) -> BotState {
        self.state_machine.current_state()
    }

    /// Registers an event subscriber
    ///
    /// Subscribers run on the broadcasting task and must not register
    /// further subscribers.
    pub fn on_event(&self, subscriber: impl Fn(&Event) + Send + Sync + 'static) {
        lock(&self.subscribers).push(Box::new(subscriber));
    }

    /// Current counters, while the crawl is running
    pub fn statistics(&self) -> Option<StatisticsSnapshot> {
        lock(&self.services)
            .as_ref()
            .map(|services| services.statistics.take_snapshot())
    }

    /// Sets up the services and activates the workflow
    ///
    /// Returns false if the bot was already started or if anything failed;
    /// in the latter case the bot shuts down as `Faulted`.
    pub async fn try_start(self: &Arc<Self>, config: &Config) -> bool {
        if self.state() == BotState::WaitingForInitialization {
            self.broadcast(&Event::start_progress(
                "Setting up and configuring services ...",
            ));
        }

        let mut outcome = None;
        let transited = self
            .state_machine
            .try_transit_next_with(BotCommand::Initialize, |transit| {
                let set_up = self.set_up_services(config);
                if set_up.is_err() && !transit.try_transit_next(BotCommand::Abort) {
                    log_transition_failure(transit.state(), BotCommand::Abort);
                }
                outcome = Some(set_up);
            });

        if !transited {
            log_transition_failure(self.state(), BotCommand::Initialize);
            return false;
        }

        let started = match outcome {
            Some(Ok((coordinator, events))) => {
                self.activate(&coordinator, &config.crawl.start_uri)
                    .map(|_| events)
            }
            Some(Err(e)) => Err(e),
            None => return false,
        };

        match started {
            Ok(events) => {
                info!(start_uri = %config.crawl.start_uri, "Workflow activated");
                self.broadcast(&Event::WorkflowActivated);
                self.spawn_event_forwarder(events);
                true
            }
            Err(e) => {
                error!("Failed to start crawl: {}", e);
                self.shutdown(BotCommand::MarkAsFaulted).await;
                false
            }
        }
    }

    /// Pauses every stage; work in flight completes
    pub fn pause(&self) -> bool {
        self.transit_with_memory(BotCommand::Pause, CrawlerCommand::Pause)
    }

    pub fn resume(&self) -> bool {
        self.transit_with_memory(BotCommand::Resume, CrawlerCommand::Resume)
    }

    /// Cancels the crawl
    pub async fn stop(self: &Arc<Self>) {
        self.shutdown(BotCommand::MarkAsCancelled).await;
    }

    /// Resolves with the terminal state once the bot has shut down
    pub async fn wait_for_completion(&self) -> BotState {
        let mut completion = self.completion.subscribe();
        loop {
            let finished = *completion.borrow_and_update();
            if let Some(state) = finished {
                return state;
            }
            if completion.changed().await.is_err() {
                return self.state();
            }
        }
    }

    /// Tears the services down and settles on the state `final_command` leads to
    ///
    /// Only the first call after a successful start has any effect.
    pub async fn shutdown(&self, final_command: BotCommand) {
        if !self.state_machine.try_transit_next(BotCommand::Stop) {
            log_transition_failure(self.state(), BotCommand::Stop);
            return;
        }

        self.broadcast(&Event::stop_progress(
            "Waiting for background tasks to complete ...",
        ));

        let mut final_command = final_command;
        let services = lock(&self.services).take();
        if let Some(services) = services {
            let statistics = Arc::clone(&services.statistics);
            if let Err(e) = services.shutdown().await {
                error!("Failed to shut down services: {}", e);
                final_command = BotCommand::MarkAsFaulted;
            }
            self.broadcast(&Event::working_progress(statistics.take_snapshot()));
        }

        self.broadcast(&Event::stop_progress("Disposing services ..."));
        if !self.state_machine.try_transit_next(final_command) {
            log_transition_failure(self.state(), final_command);
        }

        let final_state = self.state();
        info!(final_state = %final_state, "Crawl completed");
        self.broadcast(&Event::WorkflowCompleted { final_state });
        self.completion.send_replace(Some(final_state));
    }

    fn set_up_services(
        self: &Arc<Self>,
        config: &Config,
    ) -> crate::Result<(Arc<Coordinator>, UnboundedReceiver<Event>)> {
        validate(config)?;
        let scope = ResourceScope::new(config)?;
        let memory = Arc::new(Memory::new(config.pipeline.queue_capacity));
        let statistics = Arc::new(Statistics::new());
        let coordinator = Arc::new(Coordinator::new(
            Arc::new(ProcessedUrlRegister::new()),
            Arc::clone(&statistics),
            scope.clone(),
            Arc::clone(&self.id_generator),
        ));
        let events = coordinator
            .take_events()
            .ok_or(LinkscoutError::CoordinatorClosed)?;

        if !memory.try_transit(CrawlerCommand::Start) {
            log_transition_failure(memory.crawler_state(), CrawlerCommand::Start);
        }
        coordinator.start(Arc::clone(&memory))?;

        let pipeline = Pipeline::start(
            &config.pipeline,
            StageContext {
                memory: Arc::clone(&memory),
                coordinator: Arc::clone(&coordinator),
                statistics: Arc::clone(&statistics),
                scope,
                collaborators: self.collaborators.clone(),
            },
        );
        let reporter = tokio::spawn(Arc::clone(self).report_progress(
            Arc::clone(&statistics),
            memory.cancellation_token(),
            Duration::from_millis(config.pipeline.progress_report_interval_ms),
        ));

        *lock(&self.services) = Some(Services {
            memory,
            statistics,
            coordinator: Arc::clone(&coordinator),
            pipeline,
            forwarder: None,
            reporter,
        });
        Ok((coordinator, events))
    }

    /// Seeds the workflow, then runs or aborts the bot accordingly
    fn activate(&self, coordinator: &Coordinator, start_uri: &str) -> crate::Result<()> {
        self.broadcast(&Event::start_progress("Activating crawl workflow ..."));

        let activated = coordinator.try_activate_workflow(start_uri);
        let command = if activated {
            BotCommand::Run
        } else {
            BotCommand::Abort
        };
        if !self.state_machine.try_transit_next(command) {
            log_transition_failure(self.state(), command);
        }

        if activated {
            Ok(())
        } else {
            Err(LinkscoutError::Activation {
                start_url: start_uri.to_string(),
            })
        }
    }

    fn spawn_event_forwarder(self: &Arc<Self>, events: UnboundedReceiver<Event>) {
        let mut services = lock(&self.services);
        match services.as_mut() {
            Some(services) => {
                let forwarder = tokio::spawn(Arc::clone(self).forward_events(events));
                services.forwarder = Some(forwarder);
            }
            None => debug!("Crawl already shut down, dropping coordinator events"),
        }
    }

    /// Rebroadcasts coordinator events and reacts to the terminal ones
    async fn forward_events(self: Arc<Self>, mut events: UnboundedReceiver<Event>) {
        while let Some(event) = events.recv().await {
            let final_command = match &event {
                Event::NoMoreWorkToDo => Some(BotCommand::MarkAsRanToCompletion),
                Event::RedirectHappenedAtStartUrl { final_url } => {
                    error!(final_url = %final_url, "Start URL redirects elsewhere, aborting crawl");
                    Some(BotCommand::MarkAsFaulted)
                }
                _ => None,
            };

            self.broadcast(&event);

            // Shutdown awaits this task, so it cannot run on it
            if let Some(command) = final_command {
                let bot = Arc::clone(&self);
                tokio::spawn(async move { bot.shutdown(command).await });
            }
        }
    }

    async fn report_progress(
        self: Arc<Self>,
        statistics: Arc<Statistics>,
        cancellation: CancellationToken,
        interval: Duration,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                _ = ticker.tick() => {
                    self.broadcast(&Event::working_progress(statistics.take_snapshot()));
                }
            }
        }
    }

    fn transit_with_memory(&self, command: BotCommand, crawler_command: CrawlerCommand) -> bool {
        let transited = self.state_machine.try_transit_next_with(command, |_| {
            if let Some(services) = lock(&self.services).as_ref() {
                if !services.memory.try_transit(crawler_command) {
                    log_transition_failure(services.memory.crawler_state(), crawler_command);
                }
            }
        });

        if !transited {
            log_transition_failure(self.state(), command);
        }
        transited
    }

    fn broadcast(&self, event: &Event) {
        if let Some(message) = event.message() {
            info!("{}", message);
        }

        let subscribers = lock(&self.subscribers);
        for subscriber in subscribers.iter() {
            subscriber(event);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
