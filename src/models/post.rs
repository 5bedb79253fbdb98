//! Post record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// A single media attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub url: String,
    /// Alt text for images, poster URL for videos.
    #[serde(default)]
    pub alt_or_poster: String,
}

/// Engagement counters. Zero when unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub replies: u64,
    pub retweets: u64,
    pub likes: u64,
}

impl Metrics {
    pub fn total(&self) -> u64 {
        self.replies + self.retweets + self.likes
    }
}

/// Boolean annotations. Conservative: false unless positively detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFlags {
    pub is_retweet: bool,
    pub is_reply: bool,
    pub has_thread: bool,
    pub verified: bool,
}

/// One extracted post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Deduplication key, permalink ID when available.
    pub identity: String,
    /// Hash of text|timestamp|author, the second dedup key.
    pub content_hash: String,
    /// Order of first admission within the run.
    pub sequence_index: u64,
    pub text: String,
    pub author: String,
    pub timestamp_raw: String,
    pub timestamp_resolved: Option<DateTime<Utc>>,
    pub url: String,
    pub metrics: Metrics,
    pub media: Vec<MediaItem>,
    pub flags: PostFlags,
    pub language: String,
    /// Scroll pass during which the post was first seen.
    pub capture_scroll_index: u64,
    pub observed_at: DateTime<Utc>,
    /// Dense 1-based position, assigned during finalization.
    pub final_order: Option<u64>,
}

impl PostRecord {
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }

    /// A record without text and without media carries no content.
    pub fn has_content(&self) -> bool {
        self.has_text() || self.has_media()
    }
}
