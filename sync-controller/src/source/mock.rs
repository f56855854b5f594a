//! Mock signal sources for testing.

use super::{ConnectivitySource, ForegroundSignalSource};
use keepsync_types::{ConnectivityState, ForegroundSignals};
use std::sync::Arc;
use tokio::sync::watch;

/// Settable network reachability.
#[derive(Debug, Clone)]
pub struct MockConnectivity {
    tx: Arc<watch::Sender<ConnectivityState>>,
}

impl MockConnectivity {
    /// Create a source reporting `initial`.
    pub fn new(initial: ConnectivityState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Create a source reporting [`ConnectivityState::Online`].
    pub fn online() -> Self {
        Self::new(ConnectivityState::Online)
    }

    /// Create a source reporting [`ConnectivityState::Offline`].
    pub fn offline() -> Self {
        Self::new(ConnectivityState::Offline)
    }

    /// Publish a value. Repeating the current value still notifies.
    pub fn set(&self, state: ConnectivityState) {
        self.tx.send_replace(state);
    }

    /// The current value.
    pub fn current(&self) -> ConnectivityState {
        *self.tx.borrow()
    }
}

impl ConnectivitySource for MockConnectivity {
    fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.tx.subscribe()
    }
}

/// Settable application signals, one field at a time.
#[derive(Debug, Clone)]
pub struct MockForegroundSignals {
    tx: Arc<watch::Sender<ForegroundSignals>>,
}

impl MockForegroundSignals {
    /// Create a source reporting `initial`.
    pub fn new(initial: ForegroundSignals) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Publish a whole snapshot.
    pub fn set(&self, signals: ForegroundSignals) {
        self.tx.send_replace(signals);
    }

    /// Update the foreground flag.
    pub fn set_foreground(&self, value: bool) {
        self.tx.send_modify(|s| s.is_foreground = value);
    }

    /// Update the notification sync flag.
    pub fn set_syncing_for_notification(&self, value: bool) {
        self.tx.send_modify(|s| s.is_syncing_for_notification = value);
    }

    /// Update the in-call flag.
    pub fn set_in_call(&self, value: bool) {
        self.tx.send_modify(|s| s.is_in_call = value);
    }

    /// Update the ringing-call flag.
    pub fn set_ringing_call(&self, value: bool) {
        self.tx.send_modify(|s| s.has_ringing_call = value);
    }

    /// The current snapshot.
    pub fn current(&self) -> ForegroundSignals {
        *self.tx.borrow()
    }
}

impl Default for MockForegroundSignals {
    fn default() -> Self {
        Self::new(ForegroundSignals::default())
    }
}

impl ForegroundSignalSource for MockForegroundSignals {
    fn subscribe(&self) -> watch::Receiver<ForegroundSignals> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_setters_touch_one_field() {
        let signals = MockForegroundSignals::new(ForegroundSignals::foreground());
        signals.set_in_call(true);
        signals.set_foreground(false);

        let current = signals.current();
        assert!(!current.is_foreground);
        assert!(current.is_in_call);
        assert!(!current.is_syncing_for_notification);
        assert!(!current.has_ringing_call);
    }

    #[test]
    fn subscription_starts_at_current_value() {
        let connectivity = MockConnectivity::offline();
        let rx = connectivity.subscribe();
        assert_eq!(*rx.borrow(), ConnectivityState::Offline);
    }

    #[tokio::test]
    async fn clone_publishes_to_same_subscribers() {
        let signals = MockForegroundSignals::default();
        let mut rx = signals.subscribe();

        signals.clone().set_ringing_call(true);

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().has_ringing_call);
    }

    #[test]
    fn connectivity_set_and_read_back() {
        let connectivity = MockConnectivity::online();
        connectivity.set(ConnectivityState::Offline);
        assert_eq!(connectivity.current(), ConnectivityState::Offline);
    }
}
