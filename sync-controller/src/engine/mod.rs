//! Sync engine abstraction for keepsync.
//!
//! The engine performs the actual synchronization with the server. The
//! controller only ever tells it to start or stop, and listens to the state
//! it reports.
//!
//! # Design
//!
//! - `start_sync()` / `stop_sync()` are async and may take a while
//! - `subscribe()` returns a [`watch::Receiver`], which always holds the
//!   current state and wakes on every change
//!
//! A successful command does not mean the state already changed; the
//! controller waits for the state feed to converge.

mod mock;

pub use mock::MockSyncEngine;

use async_trait::async_trait;
use keepsync_types::SyncEngineState;
use thiserror::Error;
use tokio::sync::watch;

/// Engine command errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine refused or failed to execute the command.
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// The engine is not available (torn down, not yet built).
    #[error("engine unavailable")]
    Unavailable,

    /// The command did not complete in time.
    #[error("command timed out")]
    Timeout,
}

/// The external collaborator that actually syncs.
#[async_trait]
pub trait SyncEngine: Send + Sync + 'static {
    /// Start the sync loop.
    async fn start_sync(&self) -> Result<(), EngineError>;

    /// Stop the sync loop.
    async fn stop_sync(&self) -> Result<(), EngineError>;

    /// Subscribe to the engine's own state reports.
    fn subscribe(&self) -> watch::Receiver<SyncEngineState>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::CommandFailed("token expired".into());
        assert_eq!(err.to_string(), "command failed: token expired");
        assert_eq!(EngineError::Unavailable.to_string(), "engine unavailable");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }
}
