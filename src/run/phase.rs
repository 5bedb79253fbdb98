//! Run phases and their allowed transitions.

use tracing::{debug, warn};

/// Where the scroll loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Initializing,
    Scraping,
    Waiting,
    Completing,
    Cancelled,
}

impl RunPhase {
    /// Whether the loop may move from `self` to `next`.
    pub fn can_enter(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Idle, Initializing)
                | (Initializing, Scraping | Cancelled | Idle)
                | (Scraping, Waiting | Completing | Cancelled)
                | (Waiting, Scraping | Completing | Cancelled)
                | (Cancelled, Completing)
                | (Completing, Idle)
        )
    }
}

/// Current phase plus transition logging.
#[derive(Debug, Default)]
pub(crate) struct PhaseTracker {
    phase: RunPhase,
}

impl PhaseTracker {
    #[cfg(test)]
    pub fn current(&self) -> RunPhase {
        self.phase
    }

    pub fn enter(&mut self, next: RunPhase) {
        if !self.phase.can_enter(next) {
            warn!("Unexpected phase transition {:?} -> {:?}", self.phase, next);
        }
        debug!(from = ?self.phase, to = ?next, "Phase transition");
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use RunPhase::*;
        assert!(Idle.can_enter(Initializing));
        assert!(Scraping.can_enter(Waiting));
        assert!(Waiting.can_enter(Scraping));
        assert!(Waiting.can_enter(Cancelled));
        assert!(Cancelled.can_enter(Completing));
        assert!(!Idle.can_enter(Scraping));
        assert!(!Completing.can_enter(Scraping));
        assert!(!Cancelled.can_enter(Scraping));
    }

    #[test]
    fn test_tracker() {
        let mut tracker = PhaseTracker::default();
        tracker.enter(RunPhase::Initializing);
        tracker.enter(RunPhase::Scraping);
        assert_eq!(tracker.current(), RunPhase::Scraping);
    }
}
