//! Link extraction from message bodies.

use url::Url;

/// Longest URL that fits in a stored meta record.
pub const MAX_URL_LEN: usize = 500;

/// Returns the first whitespace-separated token that parses as an absolute
/// http or https URL, exactly as the author typed it.
pub fn first_link(body: &str) -> Option<String> {
    body.split_whitespace()
        .find(|token| is_absolute_http_url(token))
        .map(str::to_owned)
}

/// True when `candidate` is an absolute URL with an http or https scheme.
pub fn is_absolute_http_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_link_picks_first_url_token() {
        assert_eq!(
            first_link("check out https://example.com/a and http://example.com/b"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(
            first_link("http://example.com leading"),
            Some("http://example.com".to_string())
        );
    }

    #[test]
    fn test_first_link_ignores_non_urls() {
        assert_eq!(first_link("no links here"), None);
        assert_eq!(first_link(""), None);
        // Relative paths and bare domains are not absolute URLs
        assert_eq!(first_link("see /docs/setup for details"), None);
        assert_eq!(first_link("visit example.com sometime"), None);
        // Other schemes do not count
        assert_eq!(first_link("ftp://example.com/file"), None);
        assert_eq!(first_link("mailto:ops@example.com"), None);
    }

    #[test]
    fn test_first_link_requires_token_boundaries() {
        // A URL glued to punctuation is still one token and keeps it
        assert_eq!(
            first_link("wow https://example.com/page?q=1&x=2"),
            Some("https://example.com/page?q=1&x=2".to_string())
        );
    }

    #[test]
    fn test_is_absolute_http_url() {
        assert!(is_absolute_http_url("https://example.com/img.png"));
        assert!(is_absolute_http_url("http://example.com"));
        assert!(!is_absolute_http_url("//example.com/img.png"));
        assert!(!is_absolute_http_url("/img.png"));
        assert!(!is_absolute_http_url("img.png"));
        assert!(!is_absolute_http_url("data:image/png;base64,AAAA"));
    }
}
