//! Request generations for discarding superseded fetches.
//!
//! Every fetch takes a [`Ticket`] before it starts. Starting a newer fetch,
//! or closing the owner, advances the counter; a result whose ticket is no
//! longer current is dropped instead of applied. The request itself is not
//! aborted.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch, superseding every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    /// Invalidate all outstanding tickets.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let generation = Generation::new();
        let first = generation.begin();
        assert!(generation.is_current(first));

        let second = generation.begin();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[test]
    fn invalidate_drops_everything() {
        let generation = Generation::new();
        let ticket = generation.begin();
        generation.invalidate();
        assert!(!generation.is_current(ticket));
    }
}
