//! Open Graph and fallback metadata extraction from HTML documents.

use std::sync::OnceLock;

use regex::Regex;

/// Metadata pulled from a fetched HTML page. All fields are trimmed and
/// never empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

fn meta_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"))
}

fn meta_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:property|name)\s*=\s*["']([^"']*)["']"#).expect("valid regex")
    })
}

fn meta_content_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bcontent\s*=\s*["']([^"']*)["']"#).expect("valid regex"))
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"))
}

fn img_src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']*)["']"#).expect("valid regex")
    })
}

/// Extracts page metadata, preferring Open Graph tags over document
/// fallbacks.
///
/// Title falls back to the `<title>` element, description to
/// `<meta name="description">`, and image to the first `<img>` source.
/// Repeated Open Graph tags overwrite each other, so the last one in
/// document order wins.
pub fn extract_page_meta(html: &str) -> PageMeta {
    let mut og_title = None;
    let mut og_description = None;
    let mut og_image = None;
    let mut meta_description = None;

    for tag in meta_tag_re().find_iter(html) {
        let tag = tag.as_str();
        let Some(key) = meta_key_re().captures(tag) else {
            continue;
        };
        let Some(content) = meta_content_re().captures(tag) else {
            continue;
        };
        let value = clean_text(&content[1]);
        if value.is_none() {
            continue;
        }
        match key[1].to_ascii_lowercase().as_str() {
            "og:title" => og_title = value,
            "og:description" => og_description = value,
            "og:image" => og_image = value,
            "description" => {
                if meta_description.is_none() {
                    meta_description = value;
                }
            }
            _ => {}
        }
    }

    let title = og_title.or_else(|| {
        title_re()
            .captures(html)
            .and_then(|caps| clean_text(&caps[1]))
    });
    let description = og_description.or(meta_description);
    let image = og_image.or_else(|| {
        img_src_re()
            .captures(html)
            .and_then(|caps| clean_text(&caps[1]))
    });

    PageMeta {
        title,
        description,
        image,
    }
}

/// Trims and entity-decodes extracted text, dropping blank results.
fn clean_text(raw: &str) -> Option<String> {
    let decoded = decode_entities(raw.trim());
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Decodes the handful of entities that show up in titles and blurbs.
/// `&amp;` goes last so already-escaped entities stay escaped.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
