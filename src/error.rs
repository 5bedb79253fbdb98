//! Error types for page access and harvest runs.

use std::time::Duration;

use thiserror::Error;

/// Failures raised by a [`FeedPage`](crate::page::FeedPage) backend.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("Script error: {0}")]
    Script(String),
    #[error("Navigation error: {0}")]
    Navigation(String),
    #[error("Page unavailable: {0}")]
    Unavailable(String),
}

/// Failures that abort a run before any post is collected.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Not a profile page: {url}")]
    WrongPage { url: String },
    #[error("Invalid run settings: {0}")]
    InvalidSettings(String),
    #[error("Page was not ready within {timeout:?}")]
    PageNotReady { timeout: Duration },
    #[error("A run is already active")]
    AlreadyRunning,
    #[error("Page error: {0}")]
    Page(#[from] PageError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
