//! Prize celebration visibility with auto-hide.
//!
//! # Invariants
//! - Visible only while the observed total is at or above the target.
//! - Shown on the upward crossing of the target, never re-shown by later
//!   changes that stay above it.
//! - A visible celebration hides `duration` after the last total change.

use std::time::{Duration, Instant};

/// How long the overlay stays up without further changes.
pub const CELEBRATION_DURATION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Celebration {
    target: u32,
    duration: Duration,
    last_total: u32,
    hide_at: Option<Instant>,
}

impl Celebration {
    pub fn new(target: u32, duration: Duration) -> Self {
        Self {
            target,
            duration,
            last_total: 0,
            hide_at: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.hide_at.is_some()
    }

    /// Instant at which a visible celebration hides by itself.
    pub fn deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    /// Feeds the current star total.
    pub fn observe_total(&mut self, total: u32, now: Instant) {
        let previous = std::mem::replace(&mut self.last_total, total);
        if total < self.target {
            self.hide_at = None;
        } else if previous < self.target || (total != previous && self.is_visible()) {
            self.hide_at = Some(now + self.duration);
        }
    }

    /// Hides the celebration once its deadline has passed.
    ///
    /// Returns `true` when this call hid it.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.hide_at = None;
                true
            }
            _ => false,
        }
    }

    /// Hides immediately and cancels the pending deadline.
    pub fn dismiss(&mut self) {
        self.hide_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{Celebration, CELEBRATION_DURATION};
    use std::time::{Duration, Instant};

    fn celebration() -> Celebration {
        Celebration::new(20, CELEBRATION_DURATION)
    }

    #[test]
    fn shows_on_crossing_and_hides_after_duration() {
        let start = Instant::now();
        let mut state = celebration();
        state.observe_total(19, start);
        assert!(!state.is_visible());

        state.observe_total(20, start);
        assert!(state.is_visible());
        assert!(!state.poll(start + Duration::from_secs(9)));
        assert!(state.poll(start + CELEBRATION_DURATION));
        assert!(!state.is_visible());
    }

    #[test]
    fn change_while_visible_restarts_deadline() {
        let start = Instant::now();
        let mut state = celebration();
        state.observe_total(20, start);
        state.observe_total(21, start + Duration::from_secs(6));

        assert!(!state.poll(start + Duration::from_secs(12)));
        assert!(state.poll(start + Duration::from_secs(16)));
    }

    #[test]
    fn change_above_target_after_hiding_does_not_reshow() {
        let start = Instant::now();
        let mut state = celebration();
        state.observe_total(20, start);
        assert!(state.poll(start + CELEBRATION_DURATION));

        state.observe_total(21, start + Duration::from_secs(11));
        assert!(!state.is_visible());
    }

    #[test]
    fn dropping_below_target_hides_immediately() {
        let start = Instant::now();
        let mut state = celebration();
        state.observe_total(22, start);
        state.observe_total(19, start + Duration::from_secs(1));
        assert!(!state.is_visible());
        assert_eq!(state.deadline(), None);

        state.observe_total(20, start + Duration::from_secs(2));
        assert!(state.is_visible());
    }

    #[test]
    fn dismiss_cancels_deadline() {
        let start = Instant::now();
        let mut state = celebration();
        state.observe_total(25, start);
        state.dismiss();
        assert!(!state.is_visible());
        assert!(!state.poll(start + CELEBRATION_DURATION));
    }
}
