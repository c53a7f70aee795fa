//! URLs embedded in node text: external references and video sources.

use std::sync::LazyLock;

use regex_lite::Regex;
use url::Url;

use crate::Node;

static HTTP_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"']+"#).expect("valid regex"));

/// Strip trailing quotes, brackets, commas and whitespace.
pub fn clean_url(raw: &str) -> Option<String> {
    let cleaned = raw.trim_end_matches(|c: char| matches!(c, '"' | '\'' | '>' | ')' | ',') || c.is_whitespace());
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Site-relative paths and absolute http(s) URLs are allowed.
pub fn is_allowed_url(url: &str) -> bool {
    if url.starts_with('/') {
        return true;
    }
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub fn extract_first_http_url(text: &str) -> Option<String> {
    HTTP_URL_RE
        .find(text)
        .and_then(|found| clean_url(found.as_str()))
}

fn is_video_url(url: &str) -> bool {
    url.to_lowercase().contains(".mp4")
}

/// External URL a reference node points at: the first allowed URL in its text.
pub fn resolve_reference_url(node: Option<&Node>) -> Option<String> {
    extract_first_http_url(&node?.text).filter(|url| is_allowed_url(url))
}

/// Video shown by a node: its image URL when that is an mp4, else the first
/// mp4 URL in its text.
pub fn resolve_video_source(node: Option<&Node>) -> Option<String> {
    let node = node?;
    let usable = |url: &String| is_allowed_url(url) && is_video_url(url);

    node.image_url()
        .and_then(clean_url)
        .filter(usable)
        .or_else(|| extract_first_http_url(&node.text).filter(usable))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_strips_trailing_punctuation() {
        let text = r#"See <a href="https://example.com/page">here</a>, or (https://example.com/x),"#;
        assert_eq!(
            extract_first_http_url(text),
            Some("https://example.com/page".into())
        );
        assert_eq!(
            extract_first_http_url("visit HTTP://Example.com/a), now"),
            Some("HTTP://Example.com/a".into())
        );
        assert_eq!(extract_first_http_url("no links here"), None);
    }

    #[test]
    fn test_allowed_urls() {
        assert!(is_allowed_url("/upload/a.mp4"));
        assert!(is_allowed_url("https://example.com"));
        assert!(!is_allowed_url("javascript:alert(1)"));
        assert!(!is_allowed_url("relative/path"));
    }

    #[test]
    fn test_reference_url_from_text() {
        let node = Node::new(1, "Ref").with_text("Read more at https://example.org/story.");
        assert_eq!(
            resolve_reference_url(Some(&node)),
            Some("https://example.org/story.".into())
        );
        assert_eq!(resolve_reference_url(Some(&Node::new(2, "Empty"))), None);
        assert_eq!(resolve_reference_url(None), None);
    }

    #[test]
    fn test_video_source_prefers_image() {
        let node = Node::new(1, "Video")
            .with_image_url("/upload/demo/clip.MP4")
            .with_text("https://cdn.example.com/other.mp4");
        assert_eq!(
            resolve_video_source(Some(&node)),
            Some("/upload/demo/clip.MP4".into())
        );

        let text_only = Node::new(2, "Video")
            .with_image_url("/upload/demo/still.png")
            .with_text("<p>https://cdn.example.com/movie.mp4</p>");
        assert_eq!(
            resolve_video_source(Some(&text_only)),
            Some("https://cdn.example.com/movie.mp4".into())
        );

        let none = Node::new(3, "Plain").with_text("https://example.com/page");
        assert_eq!(resolve_video_source(Some(&none)), None);
    }
}
