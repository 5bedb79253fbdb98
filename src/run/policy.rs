//! When the scroll loop should stop on its own.

use std::time::Duration;

use tokio::time::Instant;

use crate::models::StopReason;

/// Rolling window of silence: how long passes have gone without a single
/// newly admitted post.
///
/// Starts at the first empty pass and is cleared by any pass that admits
/// something, so a post after 4.9s of silence restarts the window.
#[derive(Debug, Clone)]
pub struct SilenceWindow {
    since: Option<Instant>,
    window: Duration,
}

impl SilenceWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            since: None,
            window,
        }
    }

    pub fn observe(&mut self, new_posts: usize, now: Instant) {
        if new_posts > 0 {
            self.since = None;
        } else if self.since.is_none() {
            self.since = Some(now);
        }
    }

    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.since.map(|since| now.saturating_duration_since(since))
    }

    /// The full window has passed without new posts.
    pub fn has_elapsed(&self, now: Instant) -> bool {
        self.elapsed(now).is_some_and(|e| e >= self.window)
    }
}

/// Stop conditions that depend only on what the loop has counted.
#[derive(Debug, Clone)]
pub struct StopPolicy {
    max_posts: usize,
    max_empty_passes: u32,
    empty_passes: u32,
    silence: SilenceWindow,
}

impl StopPolicy {
    pub fn new(max_posts: usize, max_empty_passes: u32, silence_window: Duration) -> Self {
        Self {
            max_posts,
            max_empty_passes,
            empty_passes: 0,
            silence: SilenceWindow::new(silence_window),
        }
    }

    /// Account for one scraping pass.
    pub fn record_pass(&mut self, new_posts: usize, now: Instant) {
        if new_posts > 0 {
            self.empty_passes = 0;
        } else {
            self.empty_passes += 1;
        }
        self.silence.observe(new_posts, now);
    }

    pub fn empty_passes(&self) -> u32 {
        self.empty_passes
    }

    pub fn limit_reached(&self, admitted: usize) -> Option<StopReason> {
        (admitted >= self.max_posts).then_some(StopReason::MaxPostsReached(self.max_posts))
    }

    /// Enough empty passes and a full silence window.
    pub fn exhausted(&self, now: Instant) -> Option<StopReason> {
        (self.empty_passes >= self.max_empty_passes && self.silence.has_elapsed(now)).then_some(
            StopReason::NoNewContent {
                empty_passes: self.empty_passes,
            },
        )
    }
}
