//! Offline feed page over static HTML frames.
//!
//! Each frame is a full document snapshot. Scrolling advances to the next
//! frame and stays on the last one, which mimics a feed that has run out of
//! content. Layout is approximated from inline markup: hidden attributes and
//! inline styles decide visibility, and every frame is taller than the one
//! before it.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::{FeedPage, RenderedNode, ScrollAction, ScrollMetrics};
use crate::error::PageError;

const FRAME_HEIGHT: f64 = 2000.0;
const VIEWPORT_HEIGHT: f64 = 900.0;

/// Feed page backed by a list of HTML documents.
pub struct FixturePage {
    url: String,
    frames: Vec<String>,
    cursor: Mutex<FixtureCursor>,
}

#[derive(Debug, Default)]
struct FixtureCursor {
    frame: usize,
    scroll_top: f64,
}

impl FixturePage {
    pub fn new(url: impl Into<String>, frames: Vec<String>) -> Self {
        Self {
            url: url.into(),
            frames,
            cursor: Mutex::new(FixtureCursor::default()),
        }
    }

    /// A page that never changes when scrolled.
    pub fn single(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self::new(url, vec![html.into()])
    }

    /// Index of the frame currently shown.
    pub fn frame_index(&self) -> usize {
        self.cursor.lock().map(|c| c.frame).unwrap_or(0)
    }

    fn current_frame(&self) -> Option<&str> {
        let index = self.frame_index();
        self.frames.get(index).map(String::as_str)
    }

    fn scroll_height(&self, frame: usize) -> f64 {
        FRAME_HEIGHT * (frame + 1) as f64
    }
}

#[async_trait]
impl FeedPage for FixturePage {
    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.url.clone())
    }

    async fn wait_ready(&self, _timeout: Duration) -> Result<(), PageError> {
        if self.frames.is_empty() {
            return Err(PageError::Unavailable("fixture has no frames".to_string()));
        }
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Vec<RenderedNode>, PageError> {
        let Some(frame) = self.current_frame() else {
            return Ok(Vec::new());
        };
        query_document(frame, selector)
    }

    async fn metrics(&self) -> Result<ScrollMetrics, PageError> {
        let cursor = self
            .cursor
            .lock()
            .map_err(|_| PageError::Unavailable("fixture cursor poisoned".to_string()))?;
        Ok(ScrollMetrics {
            scroll_height: self.scroll_height(cursor.frame),
            scroll_top: cursor.scroll_top,
            viewport_height: VIEWPORT_HEIGHT,
        })
    }

    async fn scroll(&self, action: ScrollAction) -> Result<(), PageError> {
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| PageError::Unavailable("fixture cursor poisoned".to_string()))?;

        if cursor.frame + 1 < self.frames.len() {
            cursor.frame += 1;
        }
        let bottom = self.scroll_height(cursor.frame) - VIEWPORT_HEIGHT;
        cursor.scroll_top = match action {
            ScrollAction::ToBottom => bottom,
            ScrollAction::Nudge(px) => (cursor.scroll_top + px).min(bottom),
        };
        Ok(())
    }
}

/// Run a selector over a full document and report matches as rendered nodes.
pub(crate) fn query_document(html: &str, selector: &str) -> Result<Vec<RenderedNode>, PageError> {
    let parsed = Selector::parse(selector).map_err(|e| PageError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&parsed)
        .map(|el| {
            let hidden = is_hidden(&el);
            let (width, height) = if hidden { (0.0, 0.0) } else { (600.0, 120.0) };
            RenderedNode {
                html: el.html(),
                width,
                height,
                hidden,
            }
        })
        .collect())
}

/// Inline-markup approximation of computed visibility, inherited from
/// ancestors.
fn is_hidden(el: &ElementRef<'_>) -> bool {
    std::iter::once(*el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|e| hidden_by_markup(&e))
}

fn hidden_by_markup(el: &ElementRef<'_>) -> bool {
    let value = el.value();
    if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
        return true;
    }
    let style: String = value
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    style.split(';').any(|decl| {
        matches!(
            decl,
            "display:none" | "visibility:hidden" | "opacity:0" | "height:0" | "height:0px"
        )
    })
}
