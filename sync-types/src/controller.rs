//! Controller-side bookkeeping types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a controller instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerLifecycle {
    /// Created but never started.
    #[default]
    NotStarted,
    /// Subscribed to every signal source and issuing commands.
    Observing,
    /// Deactivated. Starting again makes a fresh subscription.
    Stopped,
}

impl ControllerLifecycle {
    /// Check if the controller is currently observing signals.
    pub fn is_observing(self) -> bool {
        matches!(self, Self::Observing)
    }
}

/// A command the controller can issue to the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Start the sync loop.
    Start,
    /// Stop the sync loop.
    Stop,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
        }
    }
}
