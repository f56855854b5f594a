//! # sync-types
//!
//! Signal and state types for the keepsync activity controller.
//!
//! This crate provides the vocabulary shared by every keepsync crate:
//! - [`ConnectivityState`], [`ForegroundSignals`] - Observed input signals
//! - [`SyncEngineState`] - Ground truth reported by the sync engine
//! - [`ControllerLifecycle`], [`Command`] - Controller-side bookkeeping

#![warn(missing_docs)]
#![warn(clippy::all)]

mod controller;
mod signals;

pub use controller::{Command, ControllerLifecycle};
pub use signals::{ConnectivityState, ForegroundSignals, SyncEngineState};
