//! # memosync core
//!
//! Core logic for mirroring Memos notes into a Notion database.
//!
//! This crate contains the content handling and the upstream API clients:
//! - Markdown image extraction, attachment URL collection and R2 URL rewriting
//! - Mapping a memo onto the fixed Notion page schema
//! - The webhook (single memo, create only) and bulk (paginated, find-then-write) flows
//!
//! **No HTTP server concerns**: routing and response shaping belong in `api-rest`.

pub mod attachments;
pub mod bulk;
pub mod config;
pub mod constants;
pub mod content;
pub mod error;
pub mod http;
pub mod memo;
pub mod memos;
pub mod notion;
pub mod page;
pub mod storage_url;
pub mod time;
pub mod webhook;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod test_server;

pub use bulk::{BulkSynchronizer, MemoOutcome, SyncFailure, SyncReport};
pub use config::{BulkOptions, MemosConfig, MemosEndpoint, NotionConfig, SyncConfig};
pub use error::{error_chain, SyncError, SyncResult};
pub use memo::Memo;
pub use memos::{MemoSource, MemosClient};
pub use notion::{NotionClient, PageStore};
pub use page::{Block, PageDraft, PageProperties};
pub use storage_url::UrlRewriter;
pub use webhook::{WebhookOutcome, WebhookPayload, WebhookService};
