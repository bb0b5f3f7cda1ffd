//! Keystroke debouncing for interactive queries.

use std::time::{Duration, Instant};

/// Delay between the last keystroke and the query actually running.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds the latest typed query until the typing pause has elapsed. Every
/// keystroke restarts the window; emptying the box cancels the pending query
/// so the live panel comes back untouched.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the search box content after a keystroke.
    pub fn input(&mut self, query: &str, now: Instant) {
        let q = query.trim();
        if q.is_empty() {
            self.pending = None;
        } else {
            self.pending = Some((q.to_string(), now + SEARCH_DEBOUNCE));
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// The query to run, once the pause has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, at)) if now >= *at => self.pending.take().map(|(q, _)| q),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
