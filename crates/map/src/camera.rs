//! Programmatic-move guard
//!
//! Camera changes made by the application must not be mistaken for the user
//! dragging the map. [`MoveGuard`] is armed before an animation starts and
//! consumes the next settle event. If that event never arrives, the guard
//! expires at its deadline so later user gestures are not swallowed.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Runs once the programmatic move it was registered with has settled
pub type SettleCallback = Box<dyn FnOnce() + Send + 'static>;

/// Who caused a move-end event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOrigin {
    Programmatic,
    User,
}

/// Guard state
pub enum GuardState {
    Idle,
    AwaitingSettle {
        callback: Option<SettleCallback>,
        deadline: Instant,
    },
}

impl fmt::Debug for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::AwaitingSettle { callback, deadline } => f
                .debug_struct("AwaitingSettle")
                .field("callback", &callback.is_some())
                .field("deadline", deadline)
                .finish(),
        }
    }
}

#[derive(Debug)]
pub struct MoveGuard {
    state: GuardState,
    settle_timeout: Duration,
}

impl MoveGuard {
    pub fn new(settle_timeout: Duration) -> Self {
        Self {
            state: GuardState::Idle,
            settle_timeout,
        }
    }

    pub fn settle_timeout(&self) -> Duration {
        self.settle_timeout
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn is_awaiting_settle(&self) -> bool {
        matches!(self.state, GuardState::AwaitingSettle { .. })
    }

    /// Mark the next settle event as programmatic
    ///
    /// Arming an already armed guard replaces its callback; the superseded
    /// animation never reports completion.
    pub fn begin(&mut self, now: Instant, callback: Option<SettleCallback>) {
        if let GuardState::AwaitingSettle { callback: Some(_), .. } = &self.state {
            debug!("Programmatic move superseded before settling");
        }
        self.state = GuardState::AwaitingSettle {
            callback,
            deadline: now + self.settle_timeout,
        };
    }

    /// Classify a settle event and return the completion callback, if any
    ///
    /// The callback is handed back rather than invoked so the caller can run
    /// it outside whatever lock guards this value.
    pub fn on_move_end(&mut self) -> (MoveOrigin, Option<SettleCallback>) {
        match std::mem::replace(&mut self.state, GuardState::Idle) {
            GuardState::Idle => (MoveOrigin::User, None),
            GuardState::AwaitingSettle { callback, .. } => (MoveOrigin::Programmatic, callback),
        }
    }

    /// Give up on a move whose settle event never came; true if one was pending
    ///
    /// The callback of an expired move is dropped without running.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.state {
            GuardState::AwaitingSettle { deadline, .. } if now >= *deadline => {
                warn!("Programmatic move never settled, releasing guard");
                self.state = GuardState::Idle;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const TIMEOUT: Duration = Duration::from_millis(700);

    fn counting_callback(counter: &Arc<AtomicUsize>) -> SettleCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_unarmed_settle_is_user_move() {
        let mut guard = MoveGuard::new(TIMEOUT);
        let (origin, callback) = guard.on_move_end();
        assert_eq!(origin, MoveOrigin::User);
        assert!(callback.is_none());
    }

    #[test]
    fn test_armed_settle_is_programmatic_once() {
        let mut guard = MoveGuard::new(TIMEOUT);
        let fired = Arc::new(AtomicUsize::new(0));
        guard.begin(Instant::now(), Some(counting_callback(&fired)));

        let (origin, callback) = guard.on_move_end();
        assert_eq!(origin, MoveOrigin::Programmatic);
        callback.unwrap()();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        assert_eq!(guard.on_move_end().0, MoveOrigin::User);
    }

    #[test]
    fn test_callback_not_run_before_settle() {
        let mut guard = MoveGuard::new(TIMEOUT);
        let fired = Arc::new(AtomicUsize::new(0));
        guard.begin(Instant::now(), Some(counting_callback(&fired)));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(guard.is_awaiting_settle());
    }

    #[test]
    fn test_expire_respects_deadline() {
        let mut guard = MoveGuard::new(TIMEOUT);
        let start = Instant::now();
        guard.begin(start, None);

        assert!(!guard.expire(start + Duration::from_millis(699)));
        assert!(guard.is_awaiting_settle());
        assert!(guard.expire(start + TIMEOUT));
        assert!(!guard.is_awaiting_settle());
        assert!(!guard.expire(start + TIMEOUT));
    }

    #[test]
    fn test_expired_callback_is_dropped() {
        let mut guard = MoveGuard::new(TIMEOUT);
        let fired = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();
        guard.begin(start, Some(counting_callback(&fired)));

        guard.expire(start + TIMEOUT);
        assert_eq!(guard.on_move_end().0, MoveOrigin::User);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rearm_replaces_callback() {
        let mut guard = MoveGuard::new(TIMEOUT);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        guard.begin(Instant::now(), Some(counting_callback(&first)));
        guard.begin(Instant::now(), Some(counting_callback(&second)));

        let (_, callback) = guard.on_move_end();
        callback.unwrap()();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
