//! Ranked selector tables for page-level targets.
//!
//! Per-field selectors live beside their readers in the extractor. Each
//! logical target here has an ordered list of CSS selectors. The first entry
//! tracks current markup; later entries cover older layouts and looser
//! structural matches. Lookups try them in order and keep the first one that
//! matches anything.

/// Post containers.
pub const POST_CONTAINER: &[&str] = &[
    r#"article[data-testid="tweet"]"#,
    r#"[data-testid="cellInnerDiv"] article"#,
    r#"div[data-testid="tweet"]"#,
    "article[role=\"article\"]",
    "article",
];

/// Spinners shown while the feed fetches more content.
pub const LOADING_INDICATOR: &[&str] = &[
    r#"[role="progressbar"]"#,
    r#"[data-testid="cellInnerDiv"] svg circle"#,
];

/// Error, rate-limit and suspension panels.
pub const ERROR_INDICATOR: &[&str] = &[r#"[data-testid="error-detail"]"#];

/// Generic panels that only count as errors when their text matches
/// [`ERROR_TEXT_MARKERS`].
pub const ERROR_PANEL: &[&str] = &[r#"[data-testid="emptyState"]"#, r#"[role="alert"]"#];

/// Text that identifies an error panel.
pub const ERROR_TEXT_MARKERS: &[&str] = &[
    "something went wrong",
    "rate limit",
    "try reloading",
    "account suspended",
    "this account doesn",
    "hmm...this page doesn",
];

/// Text fragments marking a reply.
pub const REPLY_MARKERS: &[&str] = &["replying to"];

/// Text fragments marking a thread.
pub const THREAD_MARKERS: &[&str] = &["show this thread", "show more replies"];

/// Text fragments marking a repost in the social context banner.
pub const RETWEET_MARKERS: &[&str] = &["reposted", "retweeted"];
