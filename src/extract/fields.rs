//! Field readers and their ranked strategy tables.

use scraper::{ElementRef, Node};
use url::Url;

use super::count::{has_digits, parse_count};
use super::strategy::Strategy;
use crate::error::PageError;
use crate::models::{MediaItem, MediaKind};
use crate::page::{element_text, normalize_ws, ParsedNode};

type Read<T> = Result<Option<T>, PageError>;

pub const TEXT: &[Strategy<String>] = &[
    Strategy::new(r#"[data-testid="tweetText"]"#, rich_text),
    Strategy::new("div[lang]", rich_text),
    Strategy::new(r#"div[dir="auto"][lang]"#, rich_text),
];

pub const AUTHOR: &[Strategy<String>] = &[
    Strategy::new(r#"[data-testid="User-Name"]"#, handle_in),
    Strategy::new(r#"[data-testid="User-Names"]"#, handle_in),
    Strategy::new(r#"a[role="link"][href^="/"]"#, handle_from_link),
    Strategy::new(r#"[data-testid="User-Name"]"#, display_name),
];

pub const TIMESTAMP: &[Strategy<String>] = &[
    Strategy::new("time[datetime]", datetime_attr),
    Strategy::new("time", plain_text),
];

pub const PERMALINK: &[Strategy<String>] = &[
    Strategy::new(r#"a[href*="/status/"]:has(time)"#, href),
    Strategy::new(r#"a[href*="/status/"]"#, href),
];

pub const LANGUAGE: &[Strategy<String>] = &[
    Strategy::new(r#"[data-testid="tweetText"][lang]"#, lang_attr),
    Strategy::new("div[lang]", lang_attr),
    Strategy::new("[lang]", lang_attr),
];

pub const IMAGES: &[Strategy<Vec<MediaItem>>] = &[
    Strategy::new(r#"[data-testid="tweetPhoto"] img"#, images),
    Strategy::new(r#"img[src*="/media/"]"#, images),
    Strategy::new(r#"img[src*="pbs.twimg.com/media"]"#, images),
];

pub const VIDEOS: &[Strategy<Vec<MediaItem>>] = &[
    Strategy::new(r#"[data-testid="videoPlayer"] video"#, videos),
    Strategy::new(r#"[data-testid="videoComponent"] video"#, videos),
    Strategy::new("video", videos),
];

pub const REPLIES: &[Strategy<u64>] = &[
    Strategy::new(r#"[data-testid="reply"]"#, count_text),
    Strategy::new(r#"[data-testid="reply"]"#, count_label),
    Strategy::new(r#"[aria-label*="Repl"]"#, count_label),
];

pub const RETWEETS: &[Strategy<u64>] = &[
    Strategy::new(r#"[data-testid="retweet"]"#, count_text),
    Strategy::new(r#"[data-testid="unretweet"]"#, count_text),
    Strategy::new(r#"[data-testid="retweet"]"#, count_label),
    Strategy::new(r#"[data-testid="unretweet"]"#, count_label),
    Strategy::new(r#"[aria-label*="Repost"]"#, count_label),
    Strategy::new(r#"[aria-label*="Retweet"]"#, count_label),
];

pub const LIKES: &[Strategy<u64>] = &[
    Strategy::new(r#"[data-testid="like"]"#, count_text),
    Strategy::new(r#"[data-testid="unlike"]"#, count_text),
    Strategy::new(r#"[data-testid="like"]"#, count_label),
    Strategy::new(r#"[data-testid="unlike"]"#, count_label),
    Strategy::new(r#"[aria-label*="Like"]"#, count_label),
];

pub const RETWEET_BANNER: &[Strategy<bool>] = &[
    Strategy::new(r#"[data-testid="socialContext"]"#, mentions_retweet),
];

pub const VERIFIED: &[Strategy<bool>] = &[
    Strategy::new(r#"[data-testid="icon-verified"]"#, present),
    Strategy::new(r#"svg[aria-label*="Verified"]"#, present),
];

/// Text of the first match, keeping line breaks and emoji alt text.
fn rich_text(node: &ParsedNode, css: &str) -> Read<String> {
    Ok(node
        .select(css)?
        .first()
        .map(flatten_text)
        .filter(|t| !t.is_empty()))
}

fn plain_text(node: &ParsedNode, css: &str) -> Read<String> {
    Ok(node
        .select(css)?
        .iter()
        .map(element_text)
        .find(|t| !t.is_empty()))
}

/// `@handle` token inside the author block.
fn handle_in(node: &ParsedNode, css: &str) -> Read<String> {
    Ok(node.select(css)?.iter().find_map(|el| {
        element_text(el)
            .split_whitespace()
            .map(|w| w.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_'))
            .find(|w| w.len() > 1 && w.starts_with('@'))
            .map(str::to_string)
    }))
}

/// Handle taken from a profile link such as `href="/someone"`.
fn handle_from_link(node: &ParsedNode, css: &str) -> Read<String> {
    Ok(node.select(css)?.iter().find_map(|el| {
        let href = el.value().attr("href")?;
        let name = href.strip_prefix('/')?;
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        valid.then(|| format!("@{}", name))
    }))
}

/// Display name: the author block text before the `@handle`.
fn display_name(node: &ParsedNode, css: &str) -> Read<String> {
    Ok(node.select(css)?.first().and_then(|el| {
        let text = element_text(el);
        let name = text.split('@').next().unwrap_or_default().trim();
        let name = name.trim_end_matches('·').trim();
        (!name.is_empty()).then(|| name.to_string())
    }))
}

fn datetime_attr(node: &ParsedNode, css: &str) -> Read<String> {
    Ok(node
        .select(css)?
        .iter()
        .filter_map(|el| el.value().attr("datetime"))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string))
}

fn href(node: &ParsedNode, css: &str) -> Read<String> {
    Ok(node
        .select(css)?
        .iter()
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .find(|h| !h.is_empty())
        .map(str::to_string))
}

fn lang_attr(node: &ParsedNode, css: &str) -> Read<String> {
    Ok(node
        .select(css)?
        .iter()
        .filter_map(|el| el.value().attr("lang"))
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string))
}

fn images(node: &ParsedNode, css: &str) -> Read<Vec<MediaItem>> {
    let found: Vec<MediaItem> = node
        .select(css)?
        .iter()
        .filter_map(|el| {
            let value = el.value();
            let src = value
                .attr("src")
                .or_else(|| value.attr("srcset").and_then(first_srcset_entry))?;
            is_attached_media(src).then(|| MediaItem {
                kind: MediaKind::Image,
                url: src.to_string(),
                alt_or_poster: value.attr("alt").unwrap_or_default().trim().to_string(),
            })
        })
        .collect();
    Ok((!found.is_empty()).then_some(found))
}

fn videos(node: &ParsedNode, css: &str) -> Read<Vec<MediaItem>> {
    let found: Vec<MediaItem> = node
        .select(css)?
        .iter()
        .filter_map(|el| {
            let value = el.value();
            let poster = value.attr("poster").unwrap_or_default().trim();
            let src = value
                .attr("src")
                .or_else(|| source_child(el))
                .filter(|s| !s.trim().is_empty())
                .or((!poster.is_empty()).then_some(poster))?;
            Some(MediaItem {
                kind: MediaKind::Video,
                url: src.trim().to_string(),
                alt_or_poster: poster.to_string(),
            })
        })
        .collect();
    Ok((!found.is_empty()).then_some(found))
}

/// Count from the visible button text ("1.2K").
fn count_text(node: &ParsedNode, css: &str) -> Read<u64> {
    Ok(node
        .select(css)?
        .iter()
        .map(element_text)
        .find(|t| has_digits(t))
        .map(|t| parse_count(&t)))
}

/// Count from the accessible label ("1234 Likes. Like").
fn count_label(node: &ParsedNode, css: &str) -> Read<u64> {
    Ok(node
        .select(css)?
        .iter()
        .filter_map(|el| el.value().attr("aria-label"))
        .find_map(|label| {
            let leading = label.split_whitespace().next()?;
            has_digits(leading).then(|| parse_count(leading))
        }))
}

fn mentions_retweet(node: &ParsedNode, css: &str) -> Read<bool> {
    let found = node.select(css)?.iter().any(|el| {
        let text = element_text(el).to_lowercase();
        crate::page::selectors::RETWEET_MARKERS
            .iter()
            .any(|m| text.contains(m))
    });
    Ok(found.then_some(true))
}

fn present(node: &ParsedNode, css: &str) -> Read<bool> {
    Ok((!node.select(css)?.is_empty()).then_some(true))
}

/// Text of an element and its descendants, with `<img alt>` inlined and
/// line structure preserved.
fn flatten_text(el: &ElementRef<'_>) -> String {
    let mut raw = String::new();
    for child in el.descendants() {
        match child.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(e) if e.name() == "br" => raw.push('\n'),
            Node::Element(e) if e.name() == "img" => {
                if let Some(alt) = e.attr("alt") {
                    raw.push_str(alt);
                }
            }
            _ => {}
        }
    }
    raw.lines()
        .map(normalize_ws)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_srcset_entry(srcset: &str) -> Option<&str> {
    srcset.split(',').next()?.split_whitespace().next()
}

fn source_child<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "source")
        .find_map(|c| c.value().attr("src"))
}

/// Post media, as opposed to avatars, emoji and inline data URIs.
fn is_attached_media(src: &str) -> bool {
    let src = src.trim();
    !src.is_empty()
        && !src.starts_with("data:")
        && !src.contains("profile_images")
        && !src.contains("/emoji/")
        && !src.contains("hashflags")
}

/// Resolve a permalink against the page address and drop media suffixes
/// such as `/photo/1` and any query string.
pub fn canonical_permalink(raw: &str, page_url: &str) -> String {
    let base = Url::parse(page_url)
        .or_else(|_| Url::parse("https://x.com/"))
        .ok();
    let resolved = match base {
        Some(base) => base.join(raw).map(|u| u.to_string()).unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    };

    let without_query = resolved.split(['?', '#']).next().unwrap_or_default();
    super::identity::through_status_id(without_query)
        .unwrap_or(without_query)
        .to_string()
}

/// Whether any of `markers` occurs in the lowercased text.
pub fn contains_marker(text_lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text_lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PostNode;

    fn parse(html: &str) -> ParsedNode {
        PostNode::from_html(html).parse()
    }

    #[test]
    fn test_rich_text_keeps_emoji_and_lines() {
        let node = parse(
            r#"<article><div data-testid="tweetText"><span>Good   morning</span><img alt="☀" src="https://abs-0.twimg.com/emoji/v2/svg/2600.svg"><br><span>second line</span></div></article>"#,
        );
        assert_eq!(
            rich_text(&node, r#"[data-testid="tweetText"]"#).unwrap().as_deref(),
            Some("Good morning☀\nsecond line")
        );
    }

    #[test]
    fn test_handle_preferred_over_display_name() {
        let node = parse(
            r#"<article><div data-testid="User-Name"><span>Jane Doe</span><span>@jane_doe</span><span>·</span></div></article>"#,
        );
        let css = r#"[data-testid="User-Name"]"#;
        assert_eq!(handle_in(&node, css).unwrap().as_deref(), Some("@jane_doe"));
        assert_eq!(display_name(&node, css).unwrap().as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_handle_from_link_rejects_deep_paths() {
        let node = parse(
            r#"<article><a role="link" href="/jane/status/1">x</a><a role="link" href="/jane">Jane</a></article>"#,
        );
        assert_eq!(
            handle_from_link(&node, r#"a[role="link"][href^="/"]"#)
                .unwrap()
                .as_deref(),
            Some("@jane")
        );
    }

    #[test]
    fn test_media_filters_avatars() {
        let node = parse(
            r#"<article>
                <img src="https://pbs.twimg.com/profile_images/1/a.jpg">
                <div data-testid="tweetPhoto"><img alt="A cat" src="https://pbs.twimg.com/media/cat.jpg"></div>
                <div data-testid="videoPlayer"><video poster="https://pbs.twimg.com/thumb.jpg"><source src="blob:https://x.com/abc"></video></div>
            </article>"#,
        );
        let imgs = images(&node, "img").unwrap().unwrap();
        assert_eq!(imgs.len(), 1);
        assert_eq!(imgs[0].alt_or_poster, "A cat");

        let vids = videos(&node, "video").unwrap().unwrap();
        assert_eq!(vids[0].url, "blob:https://x.com/abc");
        assert_eq!(vids[0].alt_or_poster, "https://pbs.twimg.com/thumb.jpg");
    }

    #[test]
    fn test_counts_from_text_and_label() {
        let node = parse(
            r#"<article>
                <button data-testid="reply" aria-label="12 Replies. Reply"><span></span></button>
                <button data-testid="like"><span>1.2K</span></button>
            </article>"#,
        );
        assert_eq!(count_text(&node, r#"[data-testid="reply"]"#).unwrap(), None);
        assert_eq!(count_label(&node, r#"[data-testid="reply"]"#).unwrap(), Some(12));
        assert_eq!(count_text(&node, r#"[data-testid="like"]"#).unwrap(), Some(1200));
    }

    #[test]
    fn test_canonical_permalink() {
        assert_eq!(
            canonical_permalink("/jane/status/123/photo/1?s=20", "https://x.com/jane"),
            "https://x.com/jane/status/123"
        );
        assert_eq!(
            canonical_permalink("https://twitter.com/jane/status/9", "not a url"),
            "https://twitter.com/jane/status/9"
        );
    }
}
