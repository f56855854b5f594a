//! Externally owned signals observed by the controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network reachability as reported by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    /// The network is reachable.
    #[default]
    Online,
    /// No usable network.
    Offline,
}

impl ConnectivityState {
    /// Check if the network is reachable.
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Snapshot of every "reason to be syncing" the application reports.
///
/// Each field changes independently. The controller only ever sees the
/// latest combined snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForegroundSignals {
    /// The application is in the foreground.
    pub is_foreground: bool,
    /// A push notification asked for a sync to resolve its event.
    pub is_syncing_for_notification: bool,
    /// The user is in an active call.
    pub is_in_call: bool,
    /// A call is ringing.
    pub has_ringing_call: bool,
}

impl ForegroundSignals {
    /// Signals for an application sitting in the foreground with nothing else going on.
    pub fn foreground() -> Self {
        Self {
            is_foreground: true,
            ..Self::default()
        }
    }

    /// Signals for a backgrounded application with no pending work.
    pub fn background() -> Self {
        Self::default()
    }

    /// Set the foreground flag.
    pub fn with_foreground(mut self, value: bool) -> Self {
        self.is_foreground = value;
        self
    }

    /// Set the notification sync flag.
    pub fn with_syncing_for_notification(mut self, value: bool) -> Self {
        self.is_syncing_for_notification = value;
        self
    }

    /// Set the in-call flag.
    pub fn with_in_call(mut self, value: bool) -> Self {
        self.is_in_call = value;
        self
    }

    /// Set the ringing-call flag.
    pub fn with_ringing_call(mut self, value: bool) -> Self {
        self.has_ringing_call = value;
        self
    }
}

/// State reported by the sync engine itself.
///
/// This is the authority on whether sync is running. Only [`Running`]
/// counts as running; every other state is handled like [`Idle`].
///
/// [`Running`]: SyncEngineState::Running
/// [`Idle`]: SyncEngineState::Idle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEngineState {
    /// Not syncing.
    #[default]
    Idle,
    /// Sync loop is active.
    Running,
    /// The engine stopped after an error.
    Error,
    /// The engine was shut down and must be started again.
    Terminated,
    /// The engine lost its connection to the server.
    Offline,
}

impl SyncEngineState {
    /// Check if the engine reports an active sync loop.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for SyncEngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Error => "error",
            Self::Terminated => "terminated",
            Self::Offline => "offline",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_running_counts_as_running() {
        assert!(SyncEngineState::Running.is_running());
        assert!(!SyncEngineState::Idle.is_running());
        assert!(!SyncEngineState::Error.is_running());
        assert!(!SyncEngineState::Terminated.is_running());
        assert!(!SyncEngineState::Offline.is_running());
    }

    #[test]
    fn signal_builders_set_single_fields() {
        let signals = ForegroundSignals::background()
            .with_in_call(true)
            .with_ringing_call(true);

        assert!(!signals.is_foreground);
        assert!(!signals.is_syncing_for_notification);
        assert!(signals.is_in_call);
        assert!(signals.has_ringing_call);
        assert!(ForegroundSignals::foreground().is_foreground);
    }

    #[test]
    fn connectivity_serializes_as_snake_case() {
        let json = serde_json::to_string(&ConnectivityState::Offline).unwrap();
        assert_eq!(json, "\"offline\"");

        let parsed: SyncEngineState = serde_json::from_str("\"terminated\"").unwrap();
        assert_eq!(parsed, SyncEngineState::Terminated);
    }

    #[test]
    fn foreground_signals_json_shape() {
        let json = serde_json::to_value(ForegroundSignals::foreground()).unwrap();
        assert_eq!(json["is_foreground"], true);
        assert_eq!(json["is_in_call"], false);
    }

    #[test]
    fn display_names() {
        assert_eq!(ConnectivityState::Online.to_string(), "online");
        assert_eq!(SyncEngineState::Error.to_string(), "error");
    }
}
