//! Notion page shape: properties on the fixed database schema and the body blocks.

use crate::constants::{
    NOTION_CREATED_PROPERTY, NOTION_MEMO_ID_PROPERTY, NOTION_TITLE_PROPERTY, TITLE_MAX_CHARS,
};
use crate::memo::Memo;
use crate::time::normalize_time;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;

/// A single child block of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    object: &'static str,
    #[serde(flatten)]
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph { paragraph: RichTextBody },
    Image { image: ExternalFile },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichTextBody {
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalFile {
    #[serde(rename = "type")]
    kind: &'static str,
    pub external: ExternalUrl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalUrl {
    pub url: String,
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            text: TextContent {
                content: content.into(),
            },
        }
    }
}

impl Block {
    pub fn paragraph(content: impl Into<String>) -> Self {
        Self {
            object: "block",
            kind: BlockKind::Paragraph {
                paragraph: RichTextBody {
                    rich_text: vec![RichText::plain(content)],
                },
            },
        }
    }

    pub fn external_image(url: impl Into<String>) -> Self {
        Self {
            object: "block",
            kind: BlockKind::Image {
                image: ExternalFile {
                    kind: "external",
                    external: ExternalUrl { url: url.into() },
                },
            },
        }
    }
}

/// Non-blank lines of `text` in order, with trailing whitespace removed. Indentation is kept.
fn paragraph_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::trim_end)
}

/// Build the page body: one paragraph per non-blank line, then one image per URL.
pub fn build_blocks(text: &str, images: &[String]) -> Vec<Block> {
    paragraph_lines(text)
        .map(|line| Block::paragraph(line))
        .chain(images.iter().map(|url| Block::external_image(url.as_str())))
        .collect()
}

/// Collapse URLs to their first occurrence, keeping order.
pub fn dedupe_urls<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Values for the three schema properties of a memo page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageProperties {
    pub title: String,
    pub created: String,
    pub memo_id: String,
}

impl PageProperties {
    /// Derive properties from a memo and its parsed text.
    ///
    /// The title is the text's non-blank lines, falling back to the memo snippet and then
    /// the memo id, cut to [`TITLE_MAX_CHARS`] characters.
    pub fn for_memo(memo: &Memo, text: &str) -> Self {
        let from_text = paragraph_lines(text).collect::<Vec<_>>().join("\n");
        let title_source = [Some(from_text.as_str()), memo.snippet.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(memo.id());

        Self {
            title: title_source.chars().take(TITLE_MAX_CHARS).collect(),
            created: normalize_time(memo.timestamp()),
            memo_id: memo.id().to_string(),
        }
    }

    /// The `properties` object for create and update calls.
    pub fn to_json(&self) -> Value {
        json!({
            NOTION_TITLE_PROPERTY: { "title": [RichText::plain(self.title.as_str())] },
            NOTION_CREATED_PROPERTY: { "date": { "start": self.created } },
            NOTION_MEMO_ID_PROPERTY: { "rich_text": [RichText::plain(self.memo_id.as_str())] },
        })
    }
}

/// Everything needed to create one page: properties plus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDraft {
    pub properties: PageProperties,
    pub children: Vec<Block>,
}

impl PageDraft {
    pub fn new(memo: &Memo, text: &str, images: &[String]) -> Self {
        Self {
            properties: PageProperties::for_memo(memo, text),
            children: build_blocks(text, images),
        }
    }
}
