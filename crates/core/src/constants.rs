//! Constants used throughout the memosync core crate.
//!
//! Upstream API shapes (property names, headers, event tags) live here so the
//! webhook and bulk paths agree on them.

/// Webhook `activityType` that triggers a sync.
pub const MEMO_CREATED_ACTIVITY: &str = "memos.memo.created";

/// Memo identifier used when a memo carries no `name`.
pub const UNKNOWN_MEMO_ID: &str = "unknown";

/// Host suffix of Cloudflare R2 private storage endpoints.
pub const R2_PRIVATE_HOST_SUFFIX: &str = ".r2.cloudflarestorage.com";

/// Default Notion REST base URL.
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// Notion API version sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Title property of the target database.
pub const NOTION_TITLE_PROPERTY: &str = "Name";

/// Date property of the target database.
pub const NOTION_CREATED_PROPERTY: &str = "Created";

/// Rich-text property holding the memo identifier; the lookup key for existing pages.
pub const NOTION_MEMO_ID_PROPERTY: &str = "Memos ID";

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Default page size for memo listing.
pub const DEFAULT_MEMOS_PAGE_SIZE: u32 = 10;

/// Default delay after each Notion write in bulk sync, in milliseconds.
pub const DEFAULT_NOTION_DELAY_MS: u64 = 200;

/// Default wait before the webhook re-fetches attachments, in milliseconds.
pub const DEFAULT_ATTACHMENT_DELAY_MS: u64 = 10_000;

/// Default outbound HTTP timeout, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default listen address of the webhook server.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8787";
