//! Access to the live, rendered feed page.
//!
//! The scroll loop never touches a browser directly. It talks to a
//! [`FeedPage`], which can be backed by a real Chrome tab ([`browser`]) or by
//! a sequence of static HTML frames ([`FixturePage`]).

#[cfg(feature = "browser")]
pub mod browser;
mod fixture;
mod node;
mod query;
pub mod selectors;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PageError;

pub use fixture::FixturePage;
pub use node::{element_text, normalize_ws, ParsedNode, PostNode};
pub use query::{count_candidates, find_candidate_posts, find_page_signal, SignalKind};

/// A node as rendered by the page: its outer HTML plus layout facts that
/// cannot be recovered from markup alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedNode {
    pub html: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// display:none, visibility:hidden or zero opacity.
    #[serde(default)]
    pub hidden: bool,
}

impl RenderedNode {
    /// Non-zero rendered size and not hidden.
    pub fn is_visible(&self) -> bool {
        !self.hidden && self.width > 0.0 && self.height > 0.0
    }
}

/// Scroll geometry of the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Pixels between the bottom of the viewport and the end of the document.
    pub fn distance_to_bottom(&self) -> f64 {
        (self.scroll_height - (self.scroll_top + self.viewport_height)).max(0.0)
    }
}

/// How to move the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAction {
    /// Jump to the end of the document.
    ToBottom,
    /// Scroll down by a small number of pixels.
    Nudge(f64),
}

impl ScrollAction {
    /// Nudge when already within `threshold` pixels of the bottom, otherwise
    /// jump to the end.
    pub fn choose(metrics: &ScrollMetrics, threshold: f64, nudge: f64) -> Self {
        if metrics.distance_to_bottom() <= threshold {
            ScrollAction::Nudge(nudge)
        } else {
            ScrollAction::ToBottom
        }
    }
}

/// Read access to a rendered feed plus the ability to scroll it.
#[async_trait]
pub trait FeedPage: Send + Sync {
    /// Address of the currently loaded page.
    async fn current_url(&self) -> Result<String, PageError>;

    /// Wait until the document is ready for querying.
    async fn wait_ready(&self, timeout: Duration) -> Result<(), PageError>;

    /// All nodes matching a CSS selector, in document order.
    async fn query(&self, selector: &str) -> Result<Vec<RenderedNode>, PageError>;

    /// Current scroll geometry.
    async fn metrics(&self) -> Result<ScrollMetrics, PageError>;

    /// Perform one scroll action.
    async fn scroll(&self, action: ScrollAction) -> Result<(), PageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_action_choice() {
        let far = ScrollMetrics {
            scroll_height: 5000.0,
            scroll_top: 0.0,
            viewport_height: 800.0,
        };
        assert_eq!(ScrollAction::choose(&far, 200.0, 400.0), ScrollAction::ToBottom);

        let near = ScrollMetrics {
            scroll_height: 5000.0,
            scroll_top: 4100.0,
            viewport_height: 800.0,
        };
        assert_eq!(
            ScrollAction::choose(&near, 200.0, 400.0),
            ScrollAction::Nudge(400.0)
        );
    }

    #[test]
    fn test_rendered_visibility() {
        let node = RenderedNode {
            html: "<article></article>".to_string(),
            width: 600.0,
            height: 0.0,
            hidden: false,
        };
        assert!(!node.is_visible());
    }
}
