//! Mock sync engine for testing.
//!
//! Counts commands, injects failures and latency, and reports state changes
//! the way a real engine would.

use super::{EngineError, SyncEngine};
use async_trait::async_trait;
use keepsync_types::SyncEngineState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Mock sync engine for testing.
///
/// Clones share state, so a test can keep one handle while the controller
/// owns another.
#[derive(Debug, Clone)]
pub struct MockSyncEngine {
    inner: Arc<Mutex<MockEngineInner>>,
    state: Arc<watch::Sender<SyncEngineState>>,
}

#[derive(Debug)]
struct MockEngineInner {
    start_calls: usize,
    stop_calls: usize,
    fail_next_start: Option<EngineError>,
    fail_next_stop: Option<EngineError>,
    latency: Duration,
    follow_commands: bool,
    executing: usize,
    max_executing: usize,
}

impl Default for MockEngineInner {
    fn default() -> Self {
        Self {
            start_calls: 0,
            stop_calls: 0,
            fail_next_start: None,
            fail_next_stop: None,
            latency: Duration::ZERO,
            follow_commands: true,
            executing: 0,
            max_executing: 0,
        }
    }
}

impl MockSyncEngine {
    /// Create a mock engine reporting `initial`.
    pub fn new(initial: SyncEngineState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Mutex::new(MockEngineInner::default())),
            state: Arc::new(state),
        }
    }

    /// Create a mock engine that is not syncing.
    pub fn idle() -> Self {
        Self::new(SyncEngineState::Idle)
    }

    /// Create a mock engine that is already syncing.
    pub fn running() -> Self {
        Self::new(SyncEngineState::Running)
    }

    /// Number of `start_sync()` calls so far.
    pub fn start_calls(&self) -> usize {
        self.inner().start_calls
    }

    /// Number of `stop_sync()` calls so far.
    pub fn stop_calls(&self) -> usize {
        self.inner().stop_calls
    }

    /// Highest number of commands that were executing at the same time.
    pub fn max_concurrent_commands(&self) -> usize {
        self.inner().max_executing
    }

    /// Cause the next `start_sync()` to fail with the given message.
    pub fn fail_next_start(&self, error: &str) {
        self.fail_next_start_with(EngineError::CommandFailed(error.to_string()));
    }

    /// Cause the next `stop_sync()` to fail with the given message.
    pub fn fail_next_stop(&self, error: &str) {
        self.fail_next_stop_with(EngineError::CommandFailed(error.to_string()));
    }

    /// Cause the next `start_sync()` to return `error`.
    pub fn fail_next_start_with(&self, error: EngineError) {
        self.inner().fail_next_start = Some(error);
    }

    /// Cause the next `stop_sync()` to return `error`.
    pub fn fail_next_stop_with(&self, error: EngineError) {
        self.inner().fail_next_stop = Some(error);
    }

    /// Make every command take `latency` before returning.
    pub fn set_latency(&self, latency: Duration) {
        self.inner().latency = latency;
    }

    /// Whether successful commands move the reported state (default: true).
    pub fn set_follow_commands(&self, follow: bool) {
        self.inner().follow_commands = follow;
    }

    /// Report a state change the controller did not ask for.
    pub fn emit_state(&self, state: SyncEngineState) {
        self.state.send_replace(state);
    }

    /// The currently reported state.
    pub fn state(&self) -> SyncEngineState {
        *self.state.borrow()
    }

    fn inner(&self) -> MutexGuard<'_, MockEngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn execute(
        &self,
        target: SyncEngineState,
        count: fn(&mut MockEngineInner) -> Option<EngineError>,
    ) -> Result<(), EngineError> {
        let (latency, failure, follow) = {
            let mut inner = self.inner();
            let failure = count(&mut inner);
            inner.executing += 1;
            inner.max_executing = inner.max_executing.max(inner.executing);
            (inner.latency, failure, inner.follow_commands)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.inner().executing -= 1;

        if let Some(error) = failure {
            return Err(error);
        }
        if follow {
            self.state.send_replace(target);
        }
        Ok(())
    }
}

#[async_trait]
impl SyncEngine for MockSyncEngine {
    async fn start_sync(&self) -> Result<(), EngineError> {
        self.execute(SyncEngineState::Running, |inner| {
            inner.start_calls += 1;
            inner.fail_next_start.take()
        })
        .await
    }

    async fn stop_sync(&self) -> Result<(), EngineError> {
        self.execute(SyncEngineState::Idle, |inner| {
            inner.stop_calls += 1;
            inner.fail_next_stop.take()
        })
        .await
    }

    fn subscribe(&self) -> watch::Receiver<SyncEngineState> {
        self.state.subscribe()
    }
}
