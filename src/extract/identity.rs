//! Post identity derivation.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

static STATUS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status(?:es)?/(\d+)").unwrap());

/// The permalink cut right after the post ID, dropping suffixes such as
/// `/photo/1` or `/analytics`.
pub fn through_status_id(url: &str) -> Option<&str> {
    let id = STATUS_ID.captures(url)?.get(1)?;
    Some(&url[..id.end()])
}

/// Prefix marking identities that were synthesized from content.
pub const SYNTHETIC_PREFIX: &str = "h_";

/// The numeric post ID embedded in a permalink, if any.
pub fn status_id(url: &str) -> Option<&str> {
    STATUS_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Identity for a post without a permalink.
///
/// Hashes the visible content together with a per-run salt, so two
/// identical posts seen in one run collapse while nothing leaks between
/// runs.
pub fn synthetic_identity(
    run_salt: &str,
    text: &str,
    timestamp_raw: &str,
    author: &str,
    first_media: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    for part in [run_salt, text, timestamp_raw, author, first_media.unwrap_or("")] {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    let digest = hex::encode(hasher.finalize());
    format!("{}{}", SYNTHETIC_PREFIX, &digest[..24])
}

/// Pick the identity for an extracted post: the permalink ID when present,
/// otherwise a salted content hash.
pub fn derive_identity(
    url: &str,
    run_salt: &str,
    text: &str,
    timestamp_raw: &str,
    author: &str,
    first_media: Option<&str>,
) -> String {
    match status_id(url) {
        Some(id) => id.to_string(),
        None => synthetic_identity(run_salt, text, timestamp_raw, author, first_media),
    }
}
