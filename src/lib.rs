//! feedharvest - scroll-driven post extraction for social profile feeds.
//!
//! Core library: page access, extraction, deduplication, the scroll loop,
//! finalization and export. The `harvest` binary wraps it in a CLI.

pub mod address;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod extract;
pub mod finalize;
pub mod models;
pub mod page;
pub mod run;
pub mod timestamps;

pub use error::{HarvestError, PageError};
pub use models::{PostRecord, RunEvent, RunResult, RunSettings, StopReason};
pub use run::{Harvester, RunHandle};
