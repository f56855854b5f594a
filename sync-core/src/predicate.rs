//! Activity predicate: should the engine be syncing right now?

use keepsync_types::{ConnectivityState, ForegroundSignals};
use std::fmt;

/// One reason the application wants the sync loop running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncReason {
    /// The application is visible.
    Foreground,
    /// A notification is waiting on sync to resolve its event.
    Notification,
    /// An active call.
    InCall,
    /// A ringing call.
    RingingCall,
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Foreground => "foreground",
            Self::Notification => "notification",
            Self::InCall => "in_call",
            Self::RingingCall => "ringing_call",
        };
        f.write_str(name)
    }
}

/// Desired activity: the logical OR of every reason to be syncing.
pub fn desired(signals: &ForegroundSignals) -> bool {
    signals.is_foreground
        || signals.is_syncing_for_notification
        || signals.is_in_call
        || signals.has_ringing_call
}

/// Desired activity gated on the network being reachable.
pub fn effective_desired(signals: &ForegroundSignals, connectivity: ConnectivityState) -> bool {
    desired(signals) && connectivity.is_online()
}

/// List the reasons currently asking for sync, in field order.
pub fn reasons(signals: &ForegroundSignals) -> Vec<SyncReason> {
    [
        (signals.is_foreground, SyncReason::Foreground),
        (signals.is_syncing_for_notification, SyncReason::Notification),
        (signals.is_in_call, SyncReason::InCall),
        (signals.has_ringing_call, SyncReason::RingingCall),
    ]
    .into_iter()
    .filter_map(|(active, reason)| active.then_some(reason))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_reason_means_not_desired() {
        assert!(!desired(&ForegroundSignals::background()));
        assert!(reasons(&ForegroundSignals::background()).is_empty());
    }

    #[test]
    fn any_single_reason_is_enough() {
        let base = ForegroundSignals::background();
        assert!(desired(&base.with_foreground(true)));
        assert!(desired(&base.with_syncing_for_notification(true)));
        assert!(desired(&base.with_in_call(true)));
        assert!(desired(&base.with_ringing_call(true)));
    }

    #[test]
    fn offline_masks_every_reason() {
        let all = ForegroundSignals::foreground()
            .with_syncing_for_notification(true)
            .with_in_call(true)
            .with_ringing_call(true);

        assert!(effective_desired(&all, ConnectivityState::Online));
        assert!(!effective_desired(&all, ConnectivityState::Offline));
    }

    #[test]
    fn reasons_follow_field_order() {
        let signals = ForegroundSignals::background()
            .with_ringing_call(true)
            .with_foreground(true);

        assert_eq!(
            reasons(&signals),
            vec![SyncReason::Foreground, SyncReason::RingingCall]
        );
        assert_eq!(SyncReason::RingingCall.to_string(), "ringing_call");
    }
}
