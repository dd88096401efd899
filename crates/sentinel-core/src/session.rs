//! Live feed session
//!
//! A session owns a [`FeedController`] inside a single tokio task. The task
//! multiplexes the feed timer, the audit timer, highlight expiry and UI
//! commands, so every state change is serialized without locks. The UI
//! talks to it through a [`SessionHandle`]: commands go in over a channel,
//! snapshots come back on a `watch` channel and one-shot presentation
//! events on an unbounded receiver.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sentinel_config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::audit::{MAX_INCREMENT, MIN_INCREMENT};
use crate::controller::{FeedController, FeedSnapshot, UiEvent};
use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::filter::FilterState;
use crate::keyboard::{Command, Dispatch, KeyEvent, KeyboardDispatcher};
use crate::source::SourceRef;
use crate::types::{Department, RiskBands, RiskLevel, TransactionStatus};

/// Requests accepted by a running session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// A dispatched keyboard command
    Command(Command),
    /// Row click
    Click(String),
    ToggleDepartment(Department),
    ToggleRiskLevel(RiskLevel),
    ToggleStatus(TransactionStatus),
    SetFilters(FilterState),
    ClearFilters,
    SetBands(RiskBands),
    CancelAudit,
    Shutdown,
}

/// Wall clock used for highlight marks, following tokio's (pausable) clock
fn now() -> std::time::Instant {
    Instant::now().into_std()
}

/// Task state for one running feed
pub struct FeedSession {
    controller: FeedController,
    source: SourceRef,
    rng: StdRng,
    feed_interval: Duration,
    audit_interval: Duration,
    exhausted: bool,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<UiEvent>,
    snapshots: watch::Sender<Arc<FeedSnapshot>>,
    logger: DefaultErrorLogger,
}

impl FeedSession {
    /// Seed the feed from `source` and spawn the session task.
    ///
    /// The first live arrival comes one feed interval after seeding.
    pub async fn start(
        config: &Config,
        mut source: SourceRef,
    ) -> CoreResult<(SessionHandle, mpsc::UnboundedReceiver<UiEvent>)> {
        let mut controller = FeedController::from_config(config)?;
        let batch = source.initial_batch(config.feed.initial_batch).await?;
        log::info!(
            "Seeding feed with {} transactions from {} source",
            batch.len(),
            source.name()
        );
        controller.seed(batch);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(controller.snapshot(now())));

        let rng = match config.source.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let session = FeedSession {
            controller,
            source,
            rng,
            feed_interval: config.feed_interval(),
            audit_interval: config.audit_interval(),
            exhausted: false,
            commands: command_rx,
            events: event_tx,
            snapshots: snapshot_tx,
            logger: DefaultErrorLogger,
        };
        let task = tokio::spawn(session.run());

        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            dispatcher: KeyboardDispatcher::new(config.shortcuts.enabled),
            task: Some(task),
        };
        Ok((handle, event_rx))
    }

    async fn run(mut self) {
        let mut feed_tick =
            time::interval_at(Instant::now() + self.feed_interval, self.feed_interval);
        feed_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut audit_tick = time::interval(self.audit_interval);
        audit_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let expiry = self.controller.buffer().next_expiry().map(Instant::from_std);
            let audit_running = self.controller.audit().is_running();

            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(SessionCommand::Shutdown) | None => break,
                        Some(command) => {
                            let events = self.handle(command);
                            if events.contains(&UiEvent::AuditStarted) {
                                audit_tick.reset();
                            }
                            self.emit(events);
                        }
                    }
                }
                _ = feed_tick.tick(), if !self.exhausted => {
                    self.on_feed_tick().await;
                }
                _ = audit_tick.tick(), if audit_running => {
                    let increment = self.rng.gen_range(MIN_INCREMENT..MAX_INCREMENT);
                    let events = self.controller.advance_audit(increment);
                    self.emit(events);
                }
                _ = time::sleep_until(expiry.unwrap_or_else(Instant::now)), if expiry.is_some() => {
                    let expired = self.controller.sweep(now());
                    log::trace!("Expired {} highlight marks", expired);
                }
            }

            self.publish();
        }

        log::info!("Feed session stopped");
    }

    fn handle(&mut self, command: SessionCommand) -> Vec<UiEvent> {
        log::debug!("Session command: {:?}", command);
        match command {
            SessionCommand::Command(command) => self.controller.apply(command),
            SessionCommand::Click(id) => self.controller.click(&id),
            SessionCommand::ToggleDepartment(department) => {
                self.controller.toggle_department(department)
            }
            SessionCommand::ToggleRiskLevel(level) => self.controller.toggle_risk_level(level),
            SessionCommand::ToggleStatus(status) => self.controller.toggle_status(status),
            SessionCommand::SetFilters(filters) => self.controller.set_filters(filters),
            SessionCommand::ClearFilters => self.controller.clear_filters(),
            SessionCommand::SetBands(bands) => self.controller.set_bands(bands),
            SessionCommand::CancelAudit => self.controller.cancel_audit(),
            SessionCommand::Shutdown => Vec::new(),
        }
    }

    async fn on_feed_tick(&mut self) {
        match self.source.next_transaction().await {
            Ok(Some(transaction)) => {
                log::debug!("New arrival {}", transaction.summary());
                let events = self.controller.ingest(transaction, now());
                self.emit(events);
            }
            Ok(None) => {
                log::info!("Source {} exhausted; the feed is now static", self.source.name());
                self.exhausted = true;
            }
            Err(error) => {
                let context = ErrorContext::new("next_transaction")
                    .with_data("source", serde_json::json!(self.source.name()));
                self.logger.log_error(&error, &context);
            }
        }
    }

    fn emit(&self, events: Vec<UiEvent>) {
        for event in events {
            if self.events.send(event).is_err() {
                log::trace!("UI event receiver dropped");
                break;
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(Arc::new(self.controller.snapshot(now())));
    }
}

/// UI-side handle to a running session. Dropping it stops the task.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<Arc<FeedSnapshot>>,
    dispatcher: KeyboardDispatcher,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Dispatch a key press and forward any resulting command.
    ///
    /// The returned [`Dispatch`] tells the caller whether to suppress the
    /// key's default action.
    pub fn key(&self, event: &KeyEvent) -> CoreResult<Dispatch> {
        let dispatch = self.dispatcher.dispatch(event);
        if let Dispatch::Handled(command) = dispatch {
            self.send(SessionCommand::Command(command))?;
        }
        Ok(dispatch)
    }

    pub fn send(&self, command: SessionCommand) -> CoreResult<()> {
        self.commands.send(command).map_err(|_| CoreError::SessionClosed)
    }

    /// Latest published state
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Wait for the next published state
    pub async fn changed(&mut self) -> CoreResult<Arc<FeedSnapshot>> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| CoreError::SessionClosed)?;
        Ok(Arc::clone(&self.snapshots.borrow_and_update()))
    }

    /// Independent snapshot receiver
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.snapshots.clone()
    }

    pub fn shortcuts_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    /// Stop the session and wait for the task to finish
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Feed session task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
