//! MIME type detection and content-type pattern matching.

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const MARKDOWN: &str = "text/markdown; charset=utf-8";
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";
    pub const PDF: &str = "application/pdf";

    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";

    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/wav";
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";

    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
}

/// Guess MIME type from a file path's extension.
pub fn from_path(path: &Path) -> &'static str {
    from_extension(path.extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from an extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("html" | "htm") => types::HTML,
        Some("css") => types::CSS,
        Some("js" | "mjs" | "cjs") => types::JAVASCRIPT,
        Some("json") => types::JSON,
        Some("xml") => types::XML,
        Some("md") => types::MARKDOWN,
        Some("txt") => types::PLAIN,

        Some("svg") => types::SVG,
        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("gif") => types::GIF,
        Some("webp") => types::WEBP,
        Some("avif") => types::AVIF,
        Some("ico") => types::ICO,

        Some("mp3") => types::MP3,
        Some("wav") => types::WAV,
        Some("mp4" | "m4v") => types::MP4,
        Some("webm") => types::WEBM,

        Some("woff") => types::WOFF,
        Some("woff2") => types::WOFF2,
        Some("ttf") => types::TTF,
        Some("otf") => types::OTF,

        Some("pdf") => types::PDF,
        Some("wasm") => types::WASM,

        _ => types::OCTET_STREAM,
    }
}

/// Match a content type against an exact or wildcard pattern.
///
/// Patterns are either full content types (`text/css`) or a type with a
/// wildcard subtype (`image/*`). Charset parameters on the content type are
/// ignored for matching.
pub fn matches_pattern(content_type: &str, pattern: &str) -> bool {
    let bare = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();

    if pattern == "*" || pattern == "*/*" {
        return true;
    }

    match pattern.strip_suffix("/*") {
        Some(prefix) => bare
            .split('/')
            .next()
            .is_some_and(|t| t.eq_ignore_ascii_case(prefix)),
        None => bare.eq_ignore_ascii_case(pattern),
    }
}

/// Resolve a Cache-Control header value for a content type from a
/// caller-supplied pattern→value map. Exact matches win over wildcards.
pub fn cache_control_for<'a>(
    content_type: &str,
    rules: &'a [(String, String)],
) -> Option<&'a str> {
    let bare = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();

    // Exact pattern first
    if let Some((_, value)) = rules
        .iter()
        .find(|(pattern, _)| pattern.eq_ignore_ascii_case(bare))
    {
        return Some(value);
    }

    rules
        .iter()
        .find(|(pattern, _)| pattern.contains('*') && matches_pattern(content_type, pattern))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("index.html")), types::HTML);
        assert_eq!(from_path(&PathBuf::from("style.css")), types::CSS);
        assert_eq!(from_path(&PathBuf::from("app.js")), types::JAVASCRIPT);
        assert_eq!(from_path(&PathBuf::from("post.md")), types::MARKDOWN);
        assert_eq!(from_path(&PathBuf::from("logo.png")), types::PNG);
        assert_eq!(from_path(&PathBuf::from("unknown.xyz")), types::OCTET_STREAM);
    }

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern(types::CSS, "text/css"));
        assert!(matches_pattern(types::PNG, "image/*"));
        assert!(matches_pattern(types::HTML, "*"));
        assert!(!matches_pattern(types::PNG, "text/*"));
        assert!(!matches_pattern(types::CSS, "text/html"));
    }

    #[test]
    fn test_cache_control_exact_beats_wildcard() {
        let rules = vec![
            ("image/*".to_string(), "max-age=86400".to_string()),
            ("image/svg+xml".to_string(), "no-cache".to_string()),
        ];
        assert_eq!(cache_control_for(types::SVG, &rules), Some("no-cache"));
        assert_eq!(cache_control_for(types::PNG, &rules), Some("max-age=86400"));
        assert_eq!(cache_control_for(types::HTML, &rules), None);
    }
}
