//! Data models for feedharvest.

mod post;
mod run;

pub use post::{MediaItem, MediaKind, Metrics, PostFlags, PostRecord};
pub use run::{
    ProgressEvent, RunEvent, RunResult, RunSettings, RunStats, StopReason, MAX_MAX_POSTS,
    MAX_SCROLL_DELAY_MS, MIN_MAX_POSTS, MIN_SCROLL_DELAY_MS,
};
