//! Signal sources observed by the controller.
//!
//! Each source hands out a [`watch::Receiver`]: it holds the current value
//! from the moment it is created and wakes on every later change. A source
//! whose sender is dropped is treated as frozen at its last value.
//!
//! Plain `watch` receivers implement both traits, so a platform layer that
//! already publishes through `watch` channels can be plugged in directly.

mod mock;

pub use mock::{MockConnectivity, MockForegroundSignals};

use keepsync_types::{ConnectivityState, ForegroundSignals};
use tokio::sync::watch;

/// Network reachability feed.
pub trait ConnectivitySource: Send + Sync + 'static {
    /// Subscribe to reachability changes.
    fn subscribe(&self) -> watch::Receiver<ConnectivityState>;
}

/// Application foreground, notification and call signals.
pub trait ForegroundSignalSource: Send + Sync + 'static {
    /// Subscribe to the combined signal snapshot.
    fn subscribe(&self) -> watch::Receiver<ForegroundSignals>;
}

impl ConnectivitySource for watch::Receiver<ConnectivityState> {
    fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.clone()
    }
}

impl ForegroundSignalSource for watch::Receiver<ForegroundSignals> {
    fn subscribe(&self) -> watch::Receiver<ForegroundSignals> {
        self.clone()
    }
}
