//! SyncController - keeps the sync engine running exactly when it should.
//!
//! # Architecture
//!
//! The controller uses the pure state machine from sync-core for every
//! decision and interprets the resulting actions: calling the engine and
//! arming the debounce timer.
//!
//! ```text
//! connectivity ─┐
//! signals ──────┼─► forwarders ─► event queue ─► worker ─► SyncEngine
//! engine state ─┘   (dedup)                        │  ▲
//!                                                  │  └── command completions
//!                                      sync-core (pure state machine)
//! ```
//!
//! One worker task per activation owns the state machine, the timer and the
//! queue receiver. Sources never touch controller state; they only push
//! tagged events. Commands run on their own tasks so the worker keeps
//! draining (and coalescing) signals while a command is in flight.
//!
//! # Example
//!
//! ```ignore
//! use keepsync_controller::{ControllerConfig, SyncController};
//!
//! let controller = SyncController::new(engine, network, app_signals, ControllerConfig::default());
//! controller.start();
//! // ...
//! controller.stop();
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keepsync_core::{predicate, Action, ControllerState, Event, TimerToken};
use keepsync_types::{
    Command, ConnectivityState, ControllerLifecycle, ForegroundSignals, SyncEngineState,
};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant};

use crate::config::ControllerConfig;
use crate::engine::SyncEngine;
use crate::source::{ConnectivitySource, ForegroundSignalSource};

/// Snapshot of what the controller currently believes and is doing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    /// Lifecycle of the controller.
    pub lifecycle: ControllerLifecycle,
    /// Number of times the controller has been started.
    pub activation: u64,
    /// Last reported engine state.
    pub engine: SyncEngineState,
    /// Last reported network reachability.
    pub connectivity: ConnectivityState,
    /// Last reported application signals.
    pub signals: ForegroundSignals,
    /// Whether sync is wanted and the network allows it.
    pub effective_desired: bool,
    /// The command currently executing.
    pub command_in_flight: Option<Command>,
    /// The decision owed once the in-flight command returns.
    pub pending_intent: Option<Command>,
    /// Whether a debounced stop is counting down.
    pub stop_scheduled: bool,
    /// Commands issued during this activation.
    pub commands_issued: u64,
    /// Commands that failed during this activation.
    pub commands_failed: u64,
}

impl ControllerStatus {
    fn observing(activation: u64, state: &ControllerState) -> Self {
        Self {
            lifecycle: ControllerLifecycle::Observing,
            activation,
            engine: state.engine_state(),
            connectivity: state.connectivity(),
            signals: state.signals(),
            effective_desired: state.effective_desired(),
            command_in_flight: state.command_in_flight(),
            pending_intent: state.pending_intent(),
            stop_scheduled: state.stop_scheduled(),
            commands_issued: state.commands_issued(),
            commands_failed: state.commands_failed(),
        }
    }
}

/// Starts and stops a [`SyncEngine`] from connectivity, foreground and call signals.
pub struct SyncController<E, C, F>
where
    E: SyncEngine,
    C: ConnectivitySource,
    F: ForegroundSignalSource,
{
    engine: Arc<E>,
    connectivity: C,
    signals: F,
    config: ControllerConfig,
    lifecycle: Mutex<Lifecycle>,
    status: Arc<watch::Sender<ControllerStatus>>,
}

#[derive(Debug, Default)]
struct Lifecycle {
    state: ControllerLifecycle,
    activation: u64,
    worker: Option<JoinHandle<()>>,
}

impl<E, C, F> SyncController<E, C, F>
where
    E: SyncEngine,
    C: ConnectivitySource,
    F: ForegroundSignalSource,
{
    /// Create a controller. Nothing is observed until [`start`](Self::start).
    pub fn new(engine: E, connectivity: C, signals: F, config: ControllerConfig) -> Self {
        let (status, _) = watch::channel(ControllerStatus::default());
        Self {
            engine: Arc::new(engine),
            connectivity,
            signals,
            config,
            lifecycle: Mutex::new(Lifecycle::default()),
            status: Arc::new(status),
        }
    }

    /// Subscribe to every signal source and begin issuing commands.
    ///
    /// If the engine is not running, one start is issued right away
    /// regardless of connectivity. Calling this while already observing does
    /// nothing. After [`stop`](Self::stop) it makes a fresh subscription.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut lifecycle = self.lock_lifecycle();
        if lifecycle.state.is_observing() {
            tracing::debug!("Sync controller already observing");
            return;
        }

        let mut connectivity_rx = self.connectivity.subscribe();
        let mut signals_rx = self.signals.subscribe();
        let mut engine_rx = self.engine.subscribe();
        let activated = Event::Activated {
            connectivity: *connectivity_rx.borrow_and_update(),
            signals: *signals_rx.borrow_and_update(),
            engine: *engine_rx.borrow_and_update(),
        };

        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer.max(1));
        let mut forwarders = JoinSet::new();
        forwarders.spawn(forward(
            connectivity_rx,
            events_tx.clone(),
            Event::ConnectivityChanged,
            "connectivity",
        ));
        forwarders.spawn(forward(
            signals_rx,
            events_tx.clone(),
            Event::SignalsChanged,
            "foreground signals",
        ));
        forwarders.spawn(forward(
            engine_rx,
            events_tx.clone(),
            Event::EngineStateChanged,
            "engine state",
        ));

        lifecycle.activation += 1;
        lifecycle.state = ControllerLifecycle::Observing;
        let activation = lifecycle.activation;
        self.status.send_modify(|status| {
            *status = ControllerStatus {
                lifecycle: ControllerLifecycle::Observing,
                activation,
                ..ControllerStatus::default()
            }
        });

        let worker = Worker {
            activation,
            state: ControllerState::new(self.config.debounce_window()),
            engine: Arc::clone(&self.engine),
            events: events_rx,
            completions: events_tx,
            timer: None,
            status: Arc::clone(&self.status),
            _forwarders: forwarders,
        };
        lifecycle.worker = Some(tokio::spawn(worker.run(activated)));
        tracing::info!("Sync controller started (activation {})", activation);
    }

    /// Unsubscribe from every source and cancel any scheduled stop.
    ///
    /// A command already executing is left to finish; its result is ignored.
    /// Calling this when not observing does nothing.
    pub fn stop(&self) {
        let mut lifecycle = self.lock_lifecycle();
        if !lifecycle.state.is_observing() {
            tracing::debug!("Sync controller not observing, nothing to stop");
            return;
        }

        // The worker checks this before issuing, so publish it first.
        self.status.send_modify(|status| {
            status.lifecycle = ControllerLifecycle::Stopped;
            status.command_in_flight = None;
            status.pending_intent = None;
            status.stop_scheduled = false;
        });
        // Aborting the worker drops its timer and forwarders with it.
        if let Some(worker) = lifecycle.worker.take() {
            worker.abort();
        }
        lifecycle.state = ControllerLifecycle::Stopped;
        tracing::info!("Sync controller stopped");
    }

    /// Current lifecycle.
    pub fn lifecycle(&self) -> ControllerLifecycle {
        self.lock_lifecycle().state
    }

    /// Latest status snapshot.
    pub fn status(&self) -> ControllerStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status snapshots.
    pub fn subscribe_status(&self) -> watch::Receiver<ControllerStatus> {
        self.status.subscribe()
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E, C, F> Drop for SyncController<E, C, F>
where
    E: SyncEngine,
    C: ConnectivitySource,
    F: ForegroundSignalSource,
{
    fn drop(&mut self) {
        self.stop();
    }
}

/// Single writer for one activation.
struct Worker<E: SyncEngine> {
    activation: u64,
    state: ControllerState,
    engine: Arc<E>,
    events: mpsc::Receiver<Event>,
    completions: mpsc::Sender<Event>,
    timer: Option<(Instant, TimerToken)>,
    status: Arc<watch::Sender<ControllerStatus>>,
    _forwarders: JoinSet<()>,
}

impl<E: SyncEngine> Worker<E> {
    async fn run(mut self, activated: Event) {
        self.apply(activated);

        loop {
            let armed = self.timer;
            let event = match armed {
                Some((deadline, token)) => tokio::select! {
                    event = self.events.recv() => event,
                    _ = time::sleep_until(deadline) => {
                        self.timer = None;
                        Some(Event::TimerFired(token))
                    }
                },
                None => self.events.recv().await,
            };

            match event {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }

    fn apply(&mut self, event: Event) {
        match &event {
            Event::Activated {
                connectivity,
                signals,
                engine,
            } => tracing::info!(
                "Observing: engine {}, network {}, reasons {:?}",
                engine,
                connectivity,
                predicate::reasons(signals)
            ),
            Event::ConnectivityChanged(connectivity) => {
                tracing::debug!("Network is now {}", connectivity)
            }
            Event::SignalsChanged(signals) => {
                tracing::debug!("Sync reasons: {:?}", predicate::reasons(signals))
            }
            Event::EngineStateChanged(engine) => tracing::debug!("Engine reports {}", engine),
            Event::TimerFired(_) => tracing::debug!("Debounce window elapsed"),
            Event::CommandCompleted { command, succeeded } => {
                tracing::debug!("Sync {} command returned (ok: {})", command, succeeded)
            }
        }

        for action in self.state.on_event(event) {
            self.execute(action);
        }
        self.publish();
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::IssueCommand(command) => self.issue(command),
            Action::ScheduleStop { delay, token } => {
                tracing::debug!("Stopping sync in {:?} unless a reason returns", delay);
                self.timer = Some((Instant::now() + delay, token));
            }
            Action::CancelScheduledStop { token } => {
                if matches!(self.timer, Some((_, armed)) if armed == token) {
                    self.timer = None;
                    tracing::debug!("Scheduled stop cancelled");
                }
            }
        }
    }

    fn issue(&self, command: Command) {
        // Checked under the status lock so stop() cannot slip in between.
        self.status.send_if_modified(|status| {
            if self.is_current(status) {
                self.spawn_command(command);
            } else {
                tracing::debug!("Controller stopped, not issuing sync {} command", command);
            }
            false
        });
    }

    fn spawn_command(&self, command: Command) {
        tracing::info!("Issuing sync {} command", command);
        let engine = Arc::clone(&self.engine);
        let completions = self.completions.clone();

        tokio::spawn(async move {
            let result = match command {
                Command::Start => engine.start_sync().await,
                Command::Stop => engine.stop_sync().await,
            };
            if let Err(e) = &result {
                tracing::warn!("Sync {} command failed: {}", command, e);
            }
            // After deactivation the queue is gone and the result is dropped.
            let _ = completions
                .send(Event::CommandCompleted {
                    command,
                    succeeded: result.is_ok(),
                })
                .await;
        });
    }

    fn publish(&self) {
        let next = ControllerStatus::observing(self.activation, &self.state);
        self.status.send_if_modified(|status| {
            if !self.is_current(status) || *status == next {
                return false;
            }
            *status = next;
            true
        });
    }

    fn is_current(&self, status: &ControllerStatus) -> bool {
        status.lifecycle.is_observing() && status.activation == self.activation
    }
}

/// Push distinct values from one source into the worker's queue.
async fn forward<T>(
    mut rx: watch::Receiver<T>,
    events: mpsc::Sender<Event>,
    wrap: fn(T) -> Event,
    source: &'static str,
) where
    T: Copy + PartialEq + Send + Sync + 'static,
{
    let mut last = *rx.borrow();
    loop {
        if rx.changed().await.is_err() {
            tracing::warn!("{} source disconnected, holding last value", source);
            return;
        }
        let value = *rx.borrow_and_update();
        if value == last {
            continue;
        }
        last = value;
        if events.send(wrap(value)).await.is_err() {
            return;
        }
    }
}
