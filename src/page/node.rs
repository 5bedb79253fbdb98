//! Post node handles and their parsed, queryable form.

use scraper::{ElementRef, Html, Selector};

use super::RenderedNode;
use crate::error::PageError;

/// Opaque handle to one candidate post node.
///
/// Holds the rendered outer HTML and layout facts. Parsing is deferred to
/// [`PostNode::parse`] so handles can be moved between tasks freely.
#[derive(Debug, Clone, PartialEq)]
pub struct PostNode {
    rendered: RenderedNode,
}

impl PostNode {
    pub fn new(rendered: RenderedNode) -> Self {
        Self { rendered }
    }

    /// Build a handle from bare markup, treated as visible.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self::new(RenderedNode {
            html: html.into(),
            width: 1.0,
            height: 1.0,
            hidden: false,
        })
    }

    pub fn html(&self) -> &str {
        &self.rendered.html
    }

    pub fn is_visible(&self) -> bool {
        self.rendered.is_visible()
    }

    /// Parse the node's markup for querying.
    pub fn parse(&self) -> ParsedNode {
        ParsedNode {
            fragment: Html::parse_fragment(&self.rendered.html),
        }
    }
}

/// Queryable DOM of a single post node.
pub struct ParsedNode {
    fragment: Html,
}

impl ParsedNode {
    /// The post container element itself.
    pub fn root(&self) -> Option<ElementRef<'_>> {
        self.fragment
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .next()
    }

    /// All descendants matching `css`. Fails only when the selector cannot
    /// be parsed.
    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>, PageError> {
        let selector = Selector::parse(css).map_err(|e| PageError::InvalidSelector {
            selector: css.to_string(),
            reason: format!("{:?}", e),
        })?;
        Ok(self.fragment.select(&selector).collect())
    }

    /// First match of the first selector in `ranked` that matches anything.
    /// Invalid selectors are skipped.
    pub fn select_first(&self, ranked: &[&str]) -> Option<ElementRef<'_>> {
        ranked
            .iter()
            .filter_map(|css| self.select(css).ok())
            .find_map(|found| found.into_iter().next())
    }

    /// Whitespace-normalized text of the whole node.
    pub fn text(&self) -> String {
        self.root().map(|el| element_text(&el)).unwrap_or_default()
    }

    /// A plausible post has a text region, a time element, or media.
    pub fn has_plausible_content(&self) -> bool {
        const CONTENT_SELECTORS: &[&str] = &[
            r#"[data-testid="tweetText"]"#,
            "[lang]",
            "time",
            "img",
            "video",
        ];
        self.select_first(CONTENT_SELECTORS).is_some()
    }

    /// Short `tag#id.class` description for log lines.
    pub fn describe(&self) -> String {
        match self.root() {
            Some(el) => describe_element(&el),
            None => "<empty>".to_string(),
        }
    }
}

/// Whitespace-normalized text content of an element.
pub fn element_text(el: &ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<Vec<_>>().join(" "))
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_ws(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `tag#id.class1.class2` for an element.
pub fn describe_element(el: &ElementRef<'_>) -> String {
    let value = el.value();
    let mut out = value.name().to_string();
    if let Some(id) = value.id() {
        out.push('#');
        out.push_str(id);
    }
    for class in value.attr("class").unwrap_or_default().split_whitespace() {
        out.push('.');
        out.push_str(class);
    }
    out
}
