//! Record extractor: turns one candidate node into a [`PostRecord`].
//!
//! Every field is read through a ranked list of strategies. A field that
//! cannot be read degrades to its empty or zero default; only a node with
//! neither text nor media yields no record at all.

mod count;
mod fields;
pub mod identity;
mod strategy;

use chrono::{DateTime, Utc};

pub use count::parse_count;
pub use fields::canonical_permalink;
pub use strategy::{first_success, Strategy};

use crate::dedup::content_hash;
use crate::models::{MediaItem, Metrics, PostFlags, PostRecord};
use crate::page::selectors::{REPLY_MARKERS, THREAD_MARKERS};
use crate::page::PostNode;

/// Per-pass context handed to the extractor.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Number of scrolls performed before this pass.
    pub scroll_index: u64,
    /// Address of the page the node came from.
    pub page_url: String,
    /// Per-run salt for synthesized identities.
    pub run_salt: String,
    pub observed_at: DateTime<Utc>,
}

impl ExtractContext {
    pub fn new(scroll_index: u64, page_url: impl Into<String>, run_salt: impl Into<String>) -> Self {
        Self {
            scroll_index,
            page_url: page_url.into(),
            run_salt: run_salt.into(),
            observed_at: Utc::now(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(0, "https://x.com/someone", "test-salt")
    }
}

/// Extract a post from a candidate node.
///
/// Returns `None` when the node has neither text nor media.
pub fn extract(node: &PostNode, ctx: &ExtractContext) -> Option<PostRecord> {
    let parsed = node.parse();

    let text = first_success("text", fields::TEXT, &parsed, ctx).unwrap_or_default();
    let media = read_media(&parsed, ctx);
    if text.is_empty() && media.is_empty() {
        tracing::debug!(
            node = %parsed.describe(),
            page = %ctx.page_url,
            scroll_index = ctx.scroll_index,
            "Skipping node without text or media"
        );
        return None;
    }

    let author = first_success("author", fields::AUTHOR, &parsed, ctx).unwrap_or_default();
    let timestamp_raw =
        first_success("timestamp", fields::TIMESTAMP, &parsed, ctx).unwrap_or_default();
    let url = first_success("url", fields::PERMALINK, &parsed, ctx)
        .map(|href| canonical_permalink(&href, &ctx.page_url))
        .unwrap_or_default();
    let language = first_success("language", fields::LANGUAGE, &parsed, ctx).unwrap_or_default();

    let metrics = Metrics {
        replies: first_success("replies", fields::REPLIES, &parsed, ctx).unwrap_or(0),
        retweets: first_success("retweets", fields::RETWEETS, &parsed, ctx).unwrap_or(0),
        likes: first_success("likes", fields::LIKES, &parsed, ctx).unwrap_or(0),
    };

    let whole_text = parsed.text().to_lowercase();
    let flags = PostFlags {
        is_retweet: first_success("is_retweet", fields::RETWEET_BANNER, &parsed, ctx)
            .unwrap_or(false),
        is_reply: fields::contains_marker(&whole_text, REPLY_MARKERS),
        has_thread: fields::contains_marker(&whole_text, THREAD_MARKERS),
        verified: first_success("verified", fields::VERIFIED, &parsed, ctx).unwrap_or(false),
    };

    let identity = identity::derive_identity(
        &url,
        &ctx.run_salt,
        &text,
        &timestamp_raw,
        &author,
        media.first().map(|m| m.url.as_str()),
    );

    Some(PostRecord {
        content_hash: content_hash(&text, &timestamp_raw, &author),
        identity,
        sequence_index: 0,
        text,
        author,
        timestamp_raw,
        timestamp_resolved: None,
        url,
        metrics,
        media,
        flags,
        language,
        capture_scroll_index: ctx.scroll_index,
        observed_at: ctx.observed_at,
        final_order: None,
    })
}

/// Images then videos, without repeated URLs.
fn read_media(parsed: &crate::page::ParsedNode, ctx: &ExtractContext) -> Vec<MediaItem> {
    let mut media = first_success("images", fields::IMAGES, parsed, ctx).unwrap_or_default();
    media.extend(first_success("videos", fields::VIDEOS, parsed, ctx).unwrap_or_default());

    let mut seen = std::collections::HashSet::new();
    media.retain(|m| seen.insert(m.url.clone()));
    media
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    const FULL_POST: &str = r#"
        <article data-testid="tweet">
          <div data-testid="socialContext"><span>Jane Doe reposted</span></div>
          <div data-testid="User-Name">
            <a role="link" href="/jane"><span>Jane Doe</span></a>
            <svg data-testid="icon-verified" aria-label="Verified account"></svg>
            <a role="link" href="/jane"><span>@jane</span></a>
            <a href="/jane/status/1790000000000000001"><time datetime="2024-05-13T10:00:00.000Z">May 13</time></a>
          </div>
          <div data-testid="tweetText" lang="en"><span>Shipping the new release today</span></div>
          <div data-testid="tweetPhoto"><img alt="Screenshot" src="https://pbs.twimg.com/media/abc.jpg"></div>
          <div role="group">
            <button data-testid="reply"><span>47</span></button>
            <button data-testid="retweet"><span>3M</span></button>
            <button data-testid="like" aria-label="1200 Likes. Like"><span>1.2K</span></button>
          </div>
          <span>Show this thread</span>
        </article>
    "#;

    #[test]
    fn test_extract_full_post() {
        let ctx = ExtractContext::new(3, "https://x.com/jane", "salt");
        let record = extract(&PostNode::from_html(FULL_POST), &ctx).unwrap();

        assert_eq!(record.identity, "1790000000000000001");
        assert_eq!(record.text, "Shipping the new release today");
        assert_eq!(record.author, "@jane");
        assert_eq!(record.timestamp_raw, "2024-05-13T10:00:00.000Z");
        assert_eq!(record.url, "https://x.com/jane/status/1790000000000000001");
        assert_eq!(record.language, "en");
        assert_eq!(
            record.metrics,
            Metrics {
                replies: 47,
                retweets: 3_000_000,
                likes: 1200
            }
        );
        assert_eq!(record.media.len(), 1);
        assert_eq!(record.media[0].kind, MediaKind::Image);
        assert!(record.flags.is_retweet);
        assert!(record.flags.verified);
        assert!(record.flags.has_thread);
        assert!(!record.flags.is_reply);
        assert_eq!(record.capture_scroll_index, 3);
        assert_eq!(record.final_order, None);
    }

    #[test]
    fn test_missing_fields_degrade_to_defaults() {
        let html = r#"<article><div lang="de">Guten Morgen</div></article>"#;
        let record = extract(&PostNode::from_html(html), &ExtractContext::for_tests()).unwrap();

        assert_eq!(record.text, "Guten Morgen");
        assert_eq!(record.language, "de");
        assert!(record.author.is_empty());
        assert!(record.url.is_empty());
        assert_eq!(record.metrics, Metrics::default());
        assert_eq!(record.flags, PostFlags::default());
        assert!(record.identity.starts_with(identity::SYNTHETIC_PREFIX));
    }

    #[test]
    fn test_no_text_and_no_media_is_rejected() {
        let html = r#"<article><time datetime="2024-01-01T00:00:00Z">Jan 1</time></article>"#;
        assert!(extract(&PostNode::from_html(html), &ExtractContext::for_tests()).is_none());
    }

    #[test]
    fn test_media_only_post_is_kept() {
        let html = r#"<article><a href="/jane/status/5"><time>2h</time></a>
            <div data-testid="tweetPhoto"><img src="https://pbs.twimg.com/media/x.jpg"></div></article>"#;
        let record = extract(&PostNode::from_html(html), &ExtractContext::for_tests()).unwrap();
        assert!(record.text.is_empty());
        assert_eq!(record.identity, "5");
        assert_eq!(record.timestamp_raw, "2h");
    }

    #[test]
    fn test_reply_marker() {
        let html = r#"<article><div>Replying to <a href="/bob">@bob</a></div>
            <div data-testid="tweetText">agreed</div></article>"#;
        let record = extract(&PostNode::from_html(html), &ExtractContext::for_tests()).unwrap();
        assert!(record.flags.is_reply);
    }
}
