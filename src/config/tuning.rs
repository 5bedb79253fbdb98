//! Timing and geometry constants of the scroll loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Knobs of the scroll-drive loop. The defaults are the production values;
/// tests shrink them freely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopTuning {
    /// How often the new-content wait re-checks the page.
    pub poll_interval_ms: u64,
    /// Upper bound of the new-content wait.
    pub new_content_timeout_ms: u64,
    /// Extra wait when the page still shows a loading indicator.
    pub loading_grace_ms: u64,
    /// Minimum time without new posts before the run may end.
    pub silence_window_ms: u64,
    /// Consecutive passes without new posts before the run may end.
    pub max_empty_passes: u32,
    /// Granularity of cancellation checks during delays.
    pub cancel_check_ms: u64,
    /// Budget for the document to become ready.
    pub ready_timeout_ms: u64,
    /// Within this many pixels of the bottom, nudge instead of jumping.
    pub bottom_threshold_px: f64,
    /// Nudge distance.
    pub nudge_px: f64,
}

impl Default for LoopTuning {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            new_content_timeout_ms: 10_000,
            loading_grace_ms: 2_000,
            silence_window_ms: 5_000,
            max_empty_passes: 2,
            cancel_check_ms: 100,
            ready_timeout_ms: 15_000,
            bottom_threshold_px: 200.0,
            nudge_px: 400.0,
        }
    }
}

impl LoopTuning {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn new_content_timeout(&self) -> Duration {
        Duration::from_millis(self.new_content_timeout_ms)
    }

    pub fn loading_grace(&self) -> Duration {
        Duration::from_millis(self.loading_grace_ms)
    }

    pub fn silence_window(&self) -> Duration {
        Duration::from_millis(self.silence_window_ms)
    }

    pub fn cancel_check(&self) -> Duration {
        Duration::from_millis(self.cancel_check_ms.max(1))
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}
