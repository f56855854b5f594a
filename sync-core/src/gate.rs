//! Debounce gate for the "should be syncing" signal.
//!
//! A rising edge passes through immediately. A falling edge is delayed by a
//! fixed window and can be cancelled by any rising edge before it fires.
//!
//! The gate does not own a clock. Scheduling a delayed-false hands out a
//! [`TimerToken`]; the caller arms a real timer and reports back through
//! [`DebounceGate::fire`] when it elapses. Tokens from cancelled or replaced
//! schedules are rejected, so a stale timer can never lower the gate.

use std::time::Duration;

/// Window between a stop-worthy condition appearing and the stop being issued.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(10);

/// Identifies one scheduled delayed-false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// Result of feeding a value into the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The value is true. Always reported, even if it already was.
    ImmediateTrue,
    /// A delayed-false was scheduled.
    ScheduledFalse {
        /// How long until the delayed-false fires.
        delay: Duration,
        /// Token the timer must present when it fires.
        token: TimerToken,
    },
    /// A scheduled delayed-false was cancelled before firing.
    CancelledFalse {
        /// Token of the cancelled schedule.
        token: TimerToken,
    },
    /// Nothing changed.
    NoOp,
}

/// Turns a boolean into an immediate-true, delayed-false transition.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window: Duration,
    high: bool,
    pending: Option<TimerToken>,
    next_token: u64,
}

impl DebounceGate {
    /// Create a gate with the given debounce window. The gate starts low.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            high: false,
            pending: None,
            next_token: 0,
        }
    }

    /// The debounce window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether the last observed value was true.
    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Token of the scheduled delayed-false, if any.
    pub fn pending(&self) -> Option<TimerToken> {
        self.pending
    }

    /// Feed a new value.
    ///
    /// A true value cancels any scheduled delayed-false (reported as
    /// [`Transition::CancelledFalse`]) and then reports
    /// [`Transition::ImmediateTrue`]. A false value schedules a delayed-false
    /// if the gate was high; a schedule already running is left untouched so
    /// repeated falses never push the deadline back.
    pub fn observe(&mut self, value: bool) -> Vec<Transition> {
        if value {
            let mut transitions = Vec::with_capacity(2);
            if let Some(token) = self.pending.take() {
                transitions.push(Transition::CancelledFalse { token });
            }
            self.high = true;
            transitions.push(Transition::ImmediateTrue);
            return transitions;
        }

        if self.pending.is_some() || !self.high {
            return vec![Transition::NoOp];
        }

        self.high = false;
        vec![self.schedule()]
    }

    /// Schedule a delayed-false unless one is already running.
    ///
    /// Used when the low value was already observed but something else (the
    /// engine starting on its own) makes a stop necessary again.
    pub fn arm(&mut self) -> Transition {
        self.high = false;
        if self.pending.is_some() {
            return Transition::NoOp;
        }
        self.schedule()
    }

    /// Record a false value without scheduling anything.
    ///
    /// Cancels a running schedule, since there is nothing left to stop.
    pub fn lower(&mut self) -> Transition {
        self.high = false;
        match self.pending.take() {
            Some(token) => Transition::CancelledFalse { token },
            None => Transition::NoOp,
        }
    }

    /// Report that the timer for `token` elapsed.
    ///
    /// Returns `true` if this was the live schedule, in which case the
    /// owner should act on the delayed-false. Stale tokens return `false`.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Cancel any scheduled delayed-false. The observed level is kept.
    pub fn cancel(&mut self) -> Option<TimerToken> {
        self.pending.take()
    }

    fn schedule(&mut self) -> Transition {
        self.next_token = self.next_token.wrapping_add(1);
        let token = TimerToken(self.next_token);
        self.pending = Some(token);
        Transition::ScheduledFalse {
            delay: self.window,
            token,
        }
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled_token(transitions: &[Transition]) -> TimerToken {
        match transitions {
            [Transition::ScheduledFalse { token, .. }] => *token,
            other => panic!("Expected a single ScheduledFalse, got {:?}", other),
        }
    }

    #[test]
    fn starts_low_with_nothing_pending() {
        let gate = DebounceGate::default();
        assert!(!gate.is_high());
        assert!(gate.pending().is_none());
        assert_eq!(gate.window(), Duration::from_secs(10));
    }

    #[test]
    fn true_is_immediate() {
        let mut gate = DebounceGate::default();
        assert_eq!(gate.observe(true), vec![Transition::ImmediateTrue]);
        assert!(gate.is_high());
    }

    #[test]
    fn repeated_true_is_reported_every_time() {
        let mut gate = DebounceGate::default();
        gate.observe(true);
        assert_eq!(gate.observe(true), vec![Transition::ImmediateTrue]);
    }

    #[test]
    fn false_when_already_low_is_noop() {
        let mut gate = DebounceGate::default();
        assert_eq!(gate.observe(false), vec![Transition::NoOp]);
        assert!(gate.pending().is_none());
    }

    #[test]
    fn falling_edge_schedules_with_window() {
        let mut gate = DebounceGate::new(Duration::from_secs(3));
        gate.observe(true);

        let transitions = gate.observe(false);
        assert!(matches!(
            transitions.as_slice(),
            [Transition::ScheduledFalse { delay, .. }] if *delay == Duration::from_secs(3)
        ));
        assert!(gate.pending().is_some());
    }

    #[test]
    fn repeated_false_keeps_original_schedule() {
        let mut gate = DebounceGate::default();
        gate.observe(true);
        let token = scheduled_token(&gate.observe(false));

        assert_eq!(gate.observe(false), vec![Transition::NoOp]);
        assert_eq!(gate.pending(), Some(token));
    }

    #[test]
    fn true_cancels_pending_false() {
        let mut gate = DebounceGate::default();
        gate.observe(true);
        let token = scheduled_token(&gate.observe(false));

        assert_eq!(
            gate.observe(true),
            vec![
                Transition::CancelledFalse { token },
                Transition::ImmediateTrue
            ]
        );
        assert!(gate.pending().is_none());
    }

    #[test]
    fn fire_accepts_live_token_once() {
        let mut gate = DebounceGate::default();
        gate.observe(true);
        let token = scheduled_token(&gate.observe(false));

        assert!(gate.fire(token));
        assert!(!gate.fire(token));
        assert!(gate.pending().is_none());
    }

    #[test]
    fn fire_rejects_cancelled_token() {
        let mut gate = DebounceGate::default();
        gate.observe(true);
        let stale = scheduled_token(&gate.observe(false));
        gate.observe(true);
        let live = scheduled_token(&gate.observe(false));

        assert_ne!(stale, live);
        assert!(!gate.fire(stale));
        assert!(gate.fire(live));
    }

    #[test]
    fn arm_schedules_from_low() {
        let mut gate = DebounceGate::default();
        assert!(matches!(gate.arm(), Transition::ScheduledFalse { .. }));
        assert_eq!(gate.arm(), Transition::NoOp);
    }

    #[test]
    fn lower_cancels_without_scheduling() {
        let mut gate = DebounceGate::default();
        gate.observe(true);
        let token = scheduled_token(&gate.observe(false));

        assert_eq!(gate.lower(), Transition::CancelledFalse { token });
        assert_eq!(gate.lower(), Transition::NoOp);
        assert!(!gate.is_high());
    }

    #[test]
    fn lower_from_high_does_not_schedule() {
        let mut gate = DebounceGate::default();
        gate.observe(true);
        assert_eq!(gate.lower(), Transition::NoOp);
        assert_eq!(gate.observe(false), vec![Transition::NoOp]);
    }

    #[test]
    fn cancel_drops_schedule_only() {
        let mut gate = DebounceGate::default();
        gate.observe(true);
        let token = scheduled_token(&gate.observe(false));

        assert_eq!(gate.cancel(), Some(token));
        assert_eq!(gate.cancel(), None);
        assert!(!gate.fire(token));

        gate.observe(true);
        assert_eq!(gate.cancel(), None);
        assert!(gate.is_high());
    }
}
