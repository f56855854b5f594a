//! # sync-core
//!
//! Pure decision logic for keepsync (no I/O, instant tests).
//!
//! This crate decides whether the sync engine should be running and which
//! command to issue next, without owning any task, timer or channel.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async, no clock)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (engine commands, timers, subscriptions) is performed by
//! `sync-controller`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gate;
pub mod predicate;
pub mod state;

pub use gate::{DebounceGate, TimerToken, Transition, DEFAULT_DEBOUNCE_WINDOW};
pub use predicate::{desired, effective_desired, reasons, SyncReason};
pub use state::{Action, ControllerState, Event};
