//! Sync-activity state machine for keepsync.
//!
//! This module decides when the sync engine should be started or stopped.
//! It takes events (signal changes, engine feedback, timer expiry, command
//! completion) as input and produces actions to execute.
//!
//! The actual I/O (calling the engine, arming timers) is performed by
//! sync-controller, not by this module. Only one command is ever in flight;
//! decisions made meanwhile are coalesced into a single owed intent,
//! most recent wins.

use std::time::Duration;

use keepsync_types::{Command, ConnectivityState, ForegroundSignals, SyncEngineState};

use crate::gate::{DebounceGate, TimerToken, Transition};
use crate::predicate;

/// Events that drive the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The controller subscribed to its sources; carries their current values.
    Activated {
        /// Network reachability at subscription time.
        connectivity: ConnectivityState,
        /// Application signals at subscription time.
        signals: ForegroundSignals,
        /// Engine state at subscription time.
        engine: SyncEngineState,
    },
    /// Network reachability changed.
    ConnectivityChanged(ConnectivityState),
    /// The combined application signals changed.
    SignalsChanged(ForegroundSignals),
    /// The engine reported a new state.
    EngineStateChanged(SyncEngineState),
    /// A scheduled stop elapsed.
    TimerFired(TimerToken),
    /// An issued command returned.
    CommandCompleted {
        /// Which command finished.
        command: Command,
        /// Whether the engine accepted it.
        succeeded: bool,
    },
}

/// Actions to be executed by the sync-controller.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Call the engine. Nothing else is in flight when this is emitted.
    IssueCommand(Command),
    /// Arm a timer that reports [`Event::TimerFired`] with `token` after `delay`.
    ScheduleStop {
        /// Delay before the stop is due.
        delay: Duration,
        /// Token to report back.
        token: TimerToken,
    },
    /// Disarm the timer for `token`.
    CancelScheduledStop {
        /// Token of the timer to disarm.
        token: TimerToken,
    },
}

/// Controller state machine - NO I/O, just decisions.
#[derive(Debug, Clone)]
pub struct ControllerState {
    gate: DebounceGate,
    active: bool,
    connectivity: ConnectivityState,
    signals: ForegroundSignals,
    engine: SyncEngineState,
    in_flight: Option<Command>,
    pending_intent: Option<Command>,
    bootstrapped: bool,
    commands_issued: u64,
    commands_failed: u64,
}

impl ControllerState {
    /// Create an inactive state machine with the given debounce window.
    pub fn new(window: Duration) -> Self {
        Self {
            gate: DebounceGate::new(window),
            active: false,
            connectivity: ConnectivityState::Offline,
            signals: ForegroundSignals::default(),
            engine: SyncEngineState::Idle,
            in_flight: None,
            pending_intent: None,
            bootstrapped: false,
            commands_issued: 0,
            commands_failed: 0,
        }
    }

    /// Process an event and return the actions to execute.
    ///
    /// Events other than [`Event::Activated`] are ignored while inactive.
    pub fn on_event(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::Activated {
                connectivity,
                signals,
                engine,
            } => self.activate(connectivity, signals, engine),
            _ if !self.active => vec![],

            Event::ConnectivityChanged(connectivity) => {
                if connectivity == self.connectivity {
                    return vec![];
                }
                self.connectivity = connectivity;
                self.evaluate()
            }
            Event::SignalsChanged(signals) => {
                if signals == self.signals {
                    return vec![];
                }
                self.signals = signals;
                self.evaluate()
            }
            Event::EngineStateChanged(engine) => {
                if engine == self.engine {
                    return vec![];
                }
                self.engine = engine;
                self.reconcile()
            }
            Event::TimerFired(token) => {
                if !self.gate.fire(token) || self.effective_desired() {
                    return vec![];
                }
                self.request(Command::Stop)
            }
            Event::CommandCompleted { command, succeeded } => {
                self.complete(command, succeeded)
            }
        }
    }

    /// Whether the machine has been activated.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Desired activity, gated on connectivity.
    pub fn effective_desired(&self) -> bool {
        predicate::effective_desired(&self.signals, self.connectivity)
    }

    /// Last known engine state.
    pub fn engine_state(&self) -> SyncEngineState {
        self.engine
    }

    /// Last known connectivity.
    pub fn connectivity(&self) -> ConnectivityState {
        self.connectivity
    }

    /// Last known application signals.
    pub fn signals(&self) -> ForegroundSignals {
        self.signals
    }

    /// The command currently executing, if any.
    pub fn command_in_flight(&self) -> Option<Command> {
        self.in_flight
    }

    /// The decision owed once the in-flight command returns.
    pub fn pending_intent(&self) -> Option<Command> {
        self.pending_intent
    }

    /// Whether a debounced stop is counting down.
    pub fn stop_scheduled(&self) -> bool {
        self.gate.pending().is_some()
    }

    /// Whether the bootstrap start was issued during this activation.
    pub fn bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    /// Commands issued during this activation.
    pub fn commands_issued(&self) -> u64 {
        self.commands_issued
    }

    /// Commands that returned an error during this activation.
    pub fn commands_failed(&self) -> u64 {
        self.commands_failed
    }

    fn activate(
        &mut self,
        connectivity: ConnectivityState,
        signals: ForegroundSignals,
        engine: SyncEngineState,
    ) -> Vec<Action> {
        let mut actions = self.cancel_stop();
        *self = Self {
            active: true,
            connectivity,
            signals,
            engine,
            ..Self::new(self.gate.window())
        };

        // The one start that ignores the network gate.
        if !engine.is_running() {
            self.bootstrapped = true;
            actions.extend(self.request(Command::Start));
        }

        actions.extend(self.evaluate());
        actions.extend(self.reconcile());

        // Activation's own decision is the one already in flight, not an owed one.
        if self.pending_intent.is_some() && self.pending_intent == self.in_flight {
            self.pending_intent = None;
        }
        actions
    }

    /// Feed the current effective desire into the gate.
    fn evaluate(&mut self) -> Vec<Action> {
        if self.effective_desired() {
            let mut actions = Vec::new();
            for transition in self.gate.observe(true) {
                match transition {
                    Transition::CancelledFalse { token } => {
                        actions.push(Action::CancelScheduledStop { token })
                    }
                    Transition::ImmediateTrue => actions.extend(self.request(Command::Start)),
                    Transition::ScheduledFalse { .. } | Transition::NoOp => {}
                }
            }
            return actions;
        }

        // A pending stop must always have a running engine behind it.
        let transitions = if self.engine.is_running() {
            self.gate.observe(false)
        } else {
            vec![self.gate.lower()]
        };
        transitions.into_iter().filter_map(timer_action).collect()
    }

    /// Re-derive commands after the engine changed state on its own.
    fn reconcile(&mut self) -> Vec<Action> {
        let desired = self.effective_desired();
        if self.engine.is_running() {
            if desired {
                return vec![];
            }
            return timer_action(self.gate.arm()).into_iter().collect();
        }

        let mut actions = self.cancel_stop();
        if desired {
            // Starting is never debounced.
            actions.extend(self.request(Command::Start));
        }
        actions
    }

    fn complete(&mut self, command: Command, succeeded: bool) -> Vec<Action> {
        if self.in_flight != Some(command) {
            return vec![];
        }
        self.in_flight = None;
        if !succeeded {
            self.commands_failed += 1;
        }

        match self.pending_intent.take() {
            // A successful repeat of the owed command already served it.
            Some(intent) if intent == command && succeeded => vec![],
            Some(intent) if self.still_wanted(intent) => self.request(intent),
            _ => vec![],
        }
    }

    fn request(&mut self, command: Command) -> Vec<Action> {
        if self.in_flight.is_some() {
            self.pending_intent = Some(command);
            return vec![];
        }

        let needed = match command {
            Command::Start => !self.engine.is_running(),
            Command::Stop => self.engine.is_running(),
        };
        if !needed {
            return vec![];
        }

        self.in_flight = Some(command);
        self.commands_issued += 1;
        vec![Action::IssueCommand(command)]
    }

    fn still_wanted(&self, command: Command) -> bool {
        match command {
            Command::Start => self.effective_desired(),
            Command::Stop => !self.effective_desired(),
        }
    }

    fn cancel_stop(&mut self) -> Vec<Action> {
        self.gate
            .cancel()
            .map(|token| Action::CancelScheduledStop { token })
            .into_iter()
            .collect()
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(crate::gate::DEFAULT_DEBOUNCE_WINDOW)
    }
}

fn timer_action(transition: Transition) -> Option<Action> {
    match transition {
        Transition::ScheduledFalse { delay, token } => Some(Action::ScheduleStop { delay, token }),
        Transition::CancelledFalse { token } => Some(Action::CancelScheduledStop { token }),
        Transition::ImmediateTrue | Transition::NoOp => None,
    }
}
