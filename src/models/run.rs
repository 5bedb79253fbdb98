//! Run settings, progress events and terminal results.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::PostRecord;
use crate::error::HarvestError;

pub const MIN_SCROLL_DELAY_MS: u64 = 500;
pub const MAX_SCROLL_DELAY_MS: u64 = 10_000;
pub const MIN_MAX_POSTS: usize = 10;
pub const MAX_MAX_POSTS: usize = 1000;

/// Settings supplied with a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Delay between passes in milliseconds (500-10000).
    pub scroll_delay_ms: u64,
    /// Stop once this many posts have been admitted (10-1000).
    pub max_posts: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            scroll_delay_ms: 2000,
            max_posts: 100,
        }
    }
}

impl RunSettings {
    pub fn new(scroll_delay_ms: u64, max_posts: usize) -> Self {
        Self {
            scroll_delay_ms,
            max_posts,
        }
    }

    /// Pause between passes.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    /// Reject settings outside the accepted ranges.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if !(MIN_SCROLL_DELAY_MS..=MAX_SCROLL_DELAY_MS).contains(&self.scroll_delay_ms) {
            return Err(HarvestError::InvalidSettings(format!(
                "scroll delay {}ms outside {}-{}ms",
                self.scroll_delay_ms, MIN_SCROLL_DELAY_MS, MAX_SCROLL_DELAY_MS
            )));
        }
        if !(MIN_MAX_POSTS..=MAX_MAX_POSTS).contains(&self.max_posts) {
            return Err(HarvestError::InvalidSettings(format!(
                "max posts {} outside {}-{}",
                self.max_posts, MIN_MAX_POSTS, MAX_MAX_POSTS
            )));
        }
        Ok(())
    }
}

/// Why the scroll loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum StopReason {
    /// Admitted count reached the configured maximum.
    MaxPostsReached(usize),
    /// Consecutive empty passes plus an elapsed silence window.
    NoNewContent { empty_passes: u32 },
    /// The page showed an error or rate-limit indicator.
    PageSignal,
    /// The scroll action itself failed.
    ScrollFailed(String),
    /// External stop request.
    Cancelled,
    /// One-shot snapshot, no scrolling performed.
    Snapshot,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPostsReached(max) => write!(f, "Reached the limit of {} posts", max),
            Self::NoNewContent { empty_passes } => write!(
                f,
                "No new posts after {} passes, end of feed reached",
                empty_passes
            ),
            Self::PageSignal => write!(f, "Page reported an error or rate limit"),
            Self::ScrollFailed(e) => write!(f, "Scrolling failed: {}", e),
            Self::Cancelled => write!(f, "Stopped by request"),
            Self::Snapshot => write!(f, "Snapshot of the rendered page"),
        }
    }
}

/// Aggregate statistics over the finalized posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub with_text: usize,
    pub with_media: usize,
    pub retweets: usize,
    pub replies: usize,
    pub threads: usize,
    pub verified: usize,
    pub languages: BTreeSet<String>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Emitted after every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub posts_found: usize,
    /// min(found / max_posts, 1) * 100
    pub percentage: f64,
    pub scroll_passes: u64,
    pub status: String,
}

/// Successful terminal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub posts: Vec<PostRecord>,
    pub total_scroll_passes: u64,
    pub stats: RunStats,
    pub stop_reason: StopReason,
    pub status: String,
}

/// Everything a run reports to its environment. `Completed` or `Failed`
/// is always the last event of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RunEvent {
    Progress(ProgressEvent),
    Completed(RunResult),
    Failed { error: String },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}
