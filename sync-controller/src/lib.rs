//! # sync-controller
//!
//! Decides whether a mobile chat client's background sync should be running.
//!
//! The controller watches four independent signals (network reachability,
//! foreground state, notification sync requests, call activity) and the
//! sync engine's own state, and starts or stops the engine accordingly.
//!
//! ## Features
//!
//! - **Bootstrap**: one start on activation if the engine is idle, even offline
//! - **Debounced stop**: stops only after every reason has been gone for a window
//! - **Immediate start**: starting is never delayed
//! - **Single command in flight**: later decisions are coalesced, most recent wins
//! - **Pure State Machine**: Uses sync-core for side-effect-free decisions
//!
//! ## Example
//!
//! ```ignore
//! use keepsync_controller::{
//!     ControllerConfig, MockConnectivity, MockForegroundSignals, MockSyncEngine, SyncController,
//! };
//!
//! let engine = MockSyncEngine::idle();
//! let network = MockConnectivity::online();
//! let app = MockForegroundSignals::default();
//!
//! let controller = SyncController::new(engine, network, app.clone(), ControllerConfig::default());
//! controller.start();
//!
//! // App goes to the foreground: sync starts immediately.
//! app.set_foreground(true);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod engine;
pub mod source;

pub use config::{ConfigError, ControllerConfig};
pub use controller::{ControllerStatus, SyncController};
pub use engine::{EngineError, MockSyncEngine, SyncEngine};
pub use source::{
    ConnectivitySource, ForegroundSignalSource, MockConnectivity, MockForegroundSignals,
};

pub use keepsync_core::DEFAULT_DEBOUNCE_WINDOW;
pub use keepsync_types::{
    Command, ConnectivityState, ControllerLifecycle, ForegroundSignals, SyncEngineState,
};
