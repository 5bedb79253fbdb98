//! Profile-page address validation.

use url::Url;

/// Hosts accepted when no explicit allow-list is configured.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "x.com",
    "www.x.com",
    "mobile.x.com",
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
];

/// Check that `address` has the shape of a profile page:
/// http(s) scheme, an allowed host, and exactly one non-empty path segment
/// (a trailing slash is tolerated). Query and fragment are ignored.
pub fn is_profile_url<S: AsRef<str>>(address: &str, allowed_hosts: &[S]) -> bool {
    profile_handle(address, allowed_hosts).is_some()
}

/// Return the profile handle (the single path segment) if `address` is a
/// profile page.
pub fn profile_handle<S: AsRef<str>>(address: &str, allowed_hosts: &[S]) -> Option<String> {
    let url = Url::parse(address.trim()).ok()?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if !allowed_hosts
        .iter()
        .any(|h| h.as_ref().eq_ignore_ascii_case(&host))
    {
        return None;
    }

    let path = url.path();
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if trimmed.is_empty() || trimmed.contains('/') {
        return None;
    }

    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(address: &str) -> bool {
        is_profile_url(address, DEFAULT_ALLOWED_HOSTS)
    }

    #[test]
    fn test_profile_urls_accepted() {
        assert!(check("https://x.com/someuser"));
        assert!(check("https://x.com/someuser/"));
        assert!(check("https://twitter.com/someuser"));
        assert!(check("https://X.com/someuser?lang=en"));
    }

    #[test]
    fn test_non_profile_urls_rejected() {
        assert!(!check("https://x.com/"));
        assert!(!check("https://x.com"));
        assert!(!check("https://x.com/someuser/status/123"));
        assert!(!check("https://x.com//"));
        assert!(!check("https://example.com/someuser"));
        assert!(!check("ftp://x.com/someuser"));
        assert!(!check("not a url"));
    }

    #[test]
    fn test_profile_handle() {
        assert_eq!(
            profile_handle("https://x.com/someuser/", DEFAULT_ALLOWED_HOSTS),
            Some("someuser".to_string())
        );
        assert_eq!(
            profile_handle("https://x.com/someuser", &["twitter.com"]),
            None
        );
    }
}
