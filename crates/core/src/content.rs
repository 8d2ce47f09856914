//! Markdown image extraction for memo content.

use once_cell::sync::Lazy;
use regex::Regex;

/// `![alt](url)` with an http(s) URL. `.` does not cross newlines, so alt text stays on one line.
static IMAGE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[.*?\]\((https?://[^)]+)\)").expect("image marker pattern is valid")
});

/// Memo content split into plain text and the image URLs it embedded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContent {
    pub text: String,
    pub images: Vec<String>,
}

/// Pull every inline markdown image out of `content`.
///
/// URLs come back in document order. The returned text is the input with each full
/// image marker removed, then trimmed. Absent content parses to empty text and no images.
pub fn parse_memo_content(content: Option<&str>) -> ParsedContent {
    let content = content.unwrap_or_default();

    let images = IMAGE_MARKER
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect();
    let text = IMAGE_MARKER.replace_all(content, "").trim().to_string();

    ParsedContent { text, images }
}
