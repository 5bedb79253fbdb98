//! Ranked fallback strategies for single fields.

use tracing::{debug, trace, warn};

use super::ExtractContext;
use crate::error::PageError;
use crate::page::ParsedNode;

/// Reads one field from a node using one selector.
pub type Reader<T> = fn(&ParsedNode, &str) -> Result<Option<T>, PageError>;

/// One way of reading a field: a selector plus the reader applied to it.
pub struct Strategy<T> {
    pub selector: &'static str,
    pub read: Reader<T>,
}

impl<T> Strategy<T> {
    pub const fn new(selector: &'static str, read: Reader<T>) -> Self {
        Self { selector, read }
    }
}

/// Try `strategies` in order and keep the first value produced.
///
/// A strategy that errors is logged with the field, selector, node and page
/// and the next one is tried. `None` means no strategy found the field.
pub fn first_success<T>(
    field: &'static str,
    strategies: &[Strategy<T>],
    node: &ParsedNode,
    ctx: &ExtractContext,
) -> Option<T> {
    for strategy in strategies {
        match (strategy.read)(node, strategy.selector) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => continue,
            Err(e @ PageError::InvalidSelector { .. }) => {
                warn!(
                    field,
                    selector = strategy.selector,
                    "Skipping extraction strategy: {}",
                    e
                );
            }
            Err(e) => {
                debug!(
                    field,
                    selector = strategy.selector,
                    node = %node.describe(),
                    page = %ctx.page_url,
                    scroll_index = ctx.scroll_index,
                    "Extraction strategy failed: {}",
                    e
                );
            }
        }
    }

    trace!(
        field,
        node = %node.describe(),
        page = %ctx.page_url,
        scroll_index = ctx.scroll_index,
        "No strategy produced a value"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PostNode;

    fn text_of(node: &ParsedNode, css: &str) -> Result<Option<String>, PageError> {
        Ok(node
            .select(css)?
            .first()
            .map(crate::page::element_text)
            .filter(|t| !t.is_empty()))
    }

    fn failing(_: &ParsedNode, _: &str) -> Result<Option<String>, PageError> {
        Err(PageError::Script("boom".to_string()))
    }

    const RANKED: &[Strategy<String>] = &[
        Strategy::new("p[[", text_of),
        Strategy::new("p.missing", failing),
        Strategy::new("p.empty", text_of),
        Strategy::new("p.body", text_of),
    ];

    #[test]
    fn test_first_success_skips_failures() {
        let node = PostNode::from_html(
            r#"<article><p class="empty"> </p><p class="body">hello</p></article>"#,
        )
        .parse();
        let ctx = ExtractContext::for_tests();
        assert_eq!(
            first_success("text", RANKED, &node, &ctx).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_no_value() {
        let node = PostNode::from_html("<article></article>").parse();
        let ctx = ExtractContext::for_tests();
        assert_eq!(first_success("text", &RANKED[..3], &node, &ctx), None);
    }
}
