//! Scripts evaluated in the feed tab.

use crate::error::PageError;

pub const READY_STATE: &str = "document.readyState";

pub const METRICS: &str = r#"(() => {
    const root = document.scrollingElement || document.documentElement;
    return {
        scrollHeight: root.scrollHeight,
        scrollTop: window.scrollY || root.scrollTop || 0,
        viewportHeight: window.innerHeight,
    };
})()"#;

pub const SCROLL_TO_BOTTOM: &str =
    "window.scrollTo(0, document.documentElement.scrollHeight); true";

/// Script returning every match of `selector` as `{nodes: [...]}`, or
/// `{error}` when the selector is rejected by the engine.
pub fn query(selector: &str) -> Result<String, PageError> {
    let quoted = serde_json::to_string(selector).map_err(|e| PageError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })?;

    Ok(format!(
        r#"(() => {{
    let found;
    try {{
        found = document.querySelectorAll({quoted});
    }} catch (e) {{
        return {{ error: String((e && e.message) || e) }};
    }}
    return {{
        nodes: Array.from(found).map((el) => {{
            const rect = el.getBoundingClientRect();
            const style = window.getComputedStyle(el);
            return {{
                html: el.outerHTML,
                width: rect.width,
                height: rect.height,
                hidden: style.display === 'none'
                    || style.visibility === 'hidden'
                    || parseFloat(style.opacity) === 0,
            }};
        }}),
    }};
}})()"#
    ))
}

pub fn scroll_by(px: f64) -> String {
    format!("window.scrollBy(0, {}); true", px)
}
