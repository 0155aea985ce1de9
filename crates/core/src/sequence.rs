//! Generation counters for discarding superseded responses
//!
//! Every request of a given kind takes a [`Ticket`] from a shared
//! [`RequestSequence`]. When the response arrives, it may only be applied if
//! its ticket is still the latest one issued. Older responses are dropped on
//! arrival instead of being cancelled on the wire.

use std::sync::atomic::{AtomicU64, Ordering};

/// Proof that a request was issued at a particular generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Generation number of this ticket
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Monotonic counter shared by every request of one kind.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    /// Create a counter with no requests issued
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new request, superseding all earlier tickets
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// True if no request has been issued since `ticket`
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Supersede every outstanding ticket without issuing a request
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}
