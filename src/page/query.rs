//! Page query layer: ranked selector lookups against the live page.

use tracing::{debug, warn};

use super::selectors;
use super::{FeedPage, PostNode, RenderedNode};
use crate::error::PageError;

/// Page-level indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// The feed is fetching more content.
    Loading,
    /// Error, rate limit or suspension notice.
    Error,
}

/// Run `ranked` selectors in order and return the matches of the first one
/// that yields anything. Invalid selectors and script failures are logged
/// and skipped.
async fn first_matching<P: FeedPage + ?Sized>(
    page: &P,
    ranked: &'static [&'static str],
) -> Option<(&'static str, Vec<RenderedNode>)> {
    for &selector in ranked {
        match page.query(selector).await {
            Ok(nodes) if !nodes.is_empty() => return Some((selector, nodes)),
            Ok(_) => continue,
            Err(PageError::InvalidSelector { selector, reason }) => {
                warn!("Skipping unsupported selector {:?}: {}", selector, reason);
            }
            Err(e) => {
                debug!("Selector {:?} failed: {}", selector, e);
            }
        }
    }
    None
}

/// Locate candidate post nodes currently rendered on the page.
///
/// Stage one picks the first container selector that matches anything.
/// Stage two keeps only nodes that are visible and contain a text region,
/// a time element, or media; virtualized feeds keep empty placeholders
/// around off-screen.
pub async fn find_candidate_posts<P: FeedPage + ?Sized>(page: &P) -> Vec<PostNode> {
    let Some((selector, nodes)) = first_matching(page, selectors::POST_CONTAINER).await else {
        debug!("No post containers matched");
        return Vec::new();
    };

    let matched = nodes.len();
    let candidates: Vec<PostNode> = nodes
        .into_iter()
        .map(PostNode::new)
        .filter(|node| node.is_visible() && node.parse().has_plausible_content())
        .collect();

    debug!(
        "Selector {:?} matched {} nodes, {} candidates",
        selector,
        matched,
        candidates.len()
    );
    candidates
}

/// Number of visible post containers. Hidden placeholders a virtualized
/// feed inserts ahead of real content do not count.
pub async fn count_candidates<P: FeedPage + ?Sized>(page: &P) -> usize {
    first_matching(page, selectors::POST_CONTAINER)
        .await
        .map(|(_, nodes)| nodes.iter().filter(|n| n.is_visible()).count())
        .unwrap_or(0)
}

/// Whether a page-level indicator is currently shown.
pub async fn find_page_signal<P: FeedPage + ?Sized>(page: &P, kind: SignalKind) -> bool {
    match kind {
        SignalKind::Loading => first_matching(page, selectors::LOADING_INDICATOR)
            .await
            .map(|(_, nodes)| nodes.iter().any(RenderedNode::is_visible))
            .unwrap_or(false),
        SignalKind::Error => {
            if let Some((selector, nodes)) =
                first_matching(page, selectors::ERROR_INDICATOR).await
            {
                if nodes.iter().any(RenderedNode::is_visible) {
                    debug!("Error indicator present: {:?}", selector);
                    return true;
                }
            }

            for selector in selectors::ERROR_PANEL {
                let nodes = match page.query(selector).await {
                    Ok(nodes) => nodes,
                    Err(e) => {
                        debug!("Error panel selector {:?} failed: {}", selector, e);
                        continue;
                    }
                };
                let flagged = nodes
                    .iter()
                    .filter(|n| n.is_visible())
                    .any(|n| mentions_error(&n.html));
                if flagged {
                    debug!("Error panel present: {:?}", selector);
                    return true;
                }
            }
            false
        }
    }
}

fn mentions_error(html: &str) -> bool {
    let text = PostNode::from_html(html).parse().text().to_lowercase();
    selectors::ERROR_TEXT_MARKERS
        .iter()
        .any(|marker| text.contains(marker))
}
