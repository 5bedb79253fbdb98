//! JSON and CSV export of finished runs.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::HarvestError;
use crate::models::{PostRecord, RunResult, RunSettings, RunStats, StopReason};

const CSV_HEADER: &str = "order,identity,text,author,timestamp,url,replies,retweets,likes,media_count,is_retweet,is_reply,has_thread,verified,language,captured_at";

/// Structured export document.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub profile: ProfileInfo,
    pub run: RunInfo<'a>,
    pub posts: Vec<ExportPost<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ProfileInfo {
    pub url: String,
    pub handle: String,
}

#[derive(Debug, Serialize)]
pub struct RunInfo<'a> {
    pub settings: RunSettings,
    pub stats: &'a RunStats,
    pub total_scroll_passes: u64,
    pub stop_reason: &'a StopReason,
    pub status: &'a str,
    pub exported_at: DateTime<Utc>,
}

/// A post plus fields derived for consumers.
#[derive(Debug, Serialize)]
pub struct ExportPost<'a> {
    #[serde(flatten)]
    pub post: &'a PostRecord,
    pub text_length: usize,
    pub has_media: bool,
    pub media_count: usize,
    pub total_engagement: u64,
}

impl<'a> From<&'a PostRecord> for ExportPost<'a> {
    fn from(post: &'a PostRecord) -> Self {
        Self {
            post,
            text_length: post.text.chars().count(),
            has_media: post.has_media(),
            media_count: post.media.len(),
            total_engagement: post.metrics.total(),
        }
    }
}

impl<'a> ExportDocument<'a> {
    pub fn new(
        profile_url: &str,
        handle: &str,
        settings: RunSettings,
        result: &'a RunResult,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            profile: ProfileInfo {
                url: profile_url.to_string(),
                handle: handle.to_string(),
            },
            run: RunInfo {
                settings,
                stats: &result.stats,
                total_scroll_passes: result.total_scroll_passes,
                stop_reason: &result.stop_reason,
                status: &result.status,
                exported_at,
            },
            posts: result.posts.iter().map(ExportPost::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, HarvestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// One row per post, in final order.
pub fn render_csv(posts: &[PostRecord]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", CSV_HEADER);

    for post in posts {
        let _ = writeln!(
            output,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            post.final_order.map(|o| o.to_string()).unwrap_or_default(),
            escape_csv(&post.identity),
            escape_csv(&post.text),
            escape_csv(&post.author),
            escape_csv(
                &post
                    .timestamp_resolved
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| post.timestamp_raw.clone())
            ),
            escape_csv(&post.url),
            post.metrics.replies,
            post.metrics.retweets,
            post.metrics.likes,
            post.media.len(),
            post.flags.is_retweet,
            post.flags.is_reply,
            post.flags.has_thread,
            post.flags.verified,
            escape_csv(&post.language),
            post.observed_at.to_rfc3339(),
        );
    }
    output
}

/// `<handle>_<YYYYmmdd_HHMMSS>`, the default export file stem.
pub fn default_file_stem(handle: &str, at: DateTime<Utc>) -> String {
    let handle: String = handle
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let handle = if handle.is_empty() { "profile".to_string() } else { handle };
    format!("{}_{}", handle, at.format("%Y%m%d_%H%M%S"))
}

pub async fn write_json(path: &Path, document: &ExportDocument<'_>) -> Result<(), HarvestError> {
    tokio::fs::write(path, document.to_json()?).await?;
    Ok(())
}

pub async fn write_csv(path: &Path, posts: &[PostRecord]) -> Result<(), HarvestError> {
    tokio::fs::write(path, render_csv(posts)).await?;
    Ok(())
}
