//! In-memory stand-ins for the Memos and Notion seams.
//!
//! Compiled for this crate's tests and, through the `testing` feature, for downstream
//! crates that need to drive the webhook or bulk paths without network access.

use crate::error::{SyncError, SyncResult};
use crate::memo::Memo;
use crate::memos::{ListMemosQuery, MemoPage, MemoSource};
use crate::notion::PageStore;
use crate::page::{Block, PageDraft, PageProperties};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A call made against [`RecordingPageStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create(PageDraft),
    Find(String),
    UpdateProperties {
        page_id: String,
        properties: PageProperties,
    },
    Append {
        page_id: String,
        blocks: Vec<Block>,
    },
}

/// Records every call; answers lookups from a preset memo-id to page-id map.
#[derive(Debug, Default)]
pub struct RecordingPageStore {
    calls: Mutex<Vec<StoreCall>>,
    existing: HashMap<String, String>,
    failing: HashSet<String>,
}

impl RecordingPageStore {
    pub fn with_existing(mut self, memo_id: &str, page_id: &str) -> Self {
        self.existing.insert(memo_id.to_string(), page_id.to_string());
        self
    }

    /// Make create and lookup calls for `memo_id` fail with an upstream 500.
    pub fn failing_for(mut self, memo_id: &str) -> Self {
        self.failing.insert(memo_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn created(&self) -> Vec<PageDraft> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Create(draft) => Some(draft),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: StoreCall) -> usize {
        let mut calls = self.calls.lock().expect("calls lock poisoned");
        calls.push(call);
        calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Create(_)))
            .count()
    }

    fn check(&self, memo_id: &str, operation: &'static str) -> SyncResult<()> {
        if self.failing.contains(memo_id) {
            return Err(SyncError::UpstreamStatus {
                service: "notion",
                operation,
                status: 500,
                body: "internal_server_error".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PageStore for RecordingPageStore {
    async fn create_page(&self, draft: &PageDraft) -> SyncResult<Option<String>> {
        let created = self.push(StoreCall::Create(draft.clone()));
        self.check(&draft.properties.memo_id, "create page")?;
        Ok(Some(format!("page-{created}")))
    }

    async fn find_page_by_memo_id(&self, memo_id: &str) -> SyncResult<Option<String>> {
        self.push(StoreCall::Find(memo_id.to_string()));
        self.check(memo_id, "query database")?;
        Ok(self.existing.get(memo_id).cloned())
    }

    async fn update_page_properties(
        &self,
        page_id: &str,
        properties: &PageProperties,
    ) -> SyncResult<()> {
        self.push(StoreCall::UpdateProperties {
            page_id: page_id.to_string(),
            properties: properties.clone(),
        });
        Ok(())
    }

    async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> SyncResult<()> {
        self.push(StoreCall::Append {
            page_id: page_id.to_string(),
            blocks: blocks.to_vec(),
        });
        Ok(())
    }
}

/// An owned copy of a [`ListMemosQuery`] seen by [`FakeMemoSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    pub page_size: u32,
    pub page_token: Option<String>,
    pub filter: Option<String>,
}

/// Serves preset memo pages and attachment lists.
///
/// Page `n` (zero-based) is returned for token `n`; the first page for no token. Every
/// page but the last carries the next page's index as its `nextPageToken`.
#[derive(Debug, Default)]
pub struct FakeMemoSource {
    pages: Vec<Vec<Memo>>,
    attachments: HashMap<String, Value>,
    fail_listing: bool,
    fail_attachments: bool,
    list_requests: Mutex<Vec<RecordedQuery>>,
    attachment_requests: Mutex<Vec<String>>,
}

impl FakeMemoSource {
    pub fn paged(pages: Vec<Vec<Memo>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn with_attachments(mut self, memo_short_id: &str, attachments: Value) -> Self {
        self.attachments
            .insert(memo_short_id.to_string(), attachments);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_attachments(mut self) -> Self {
        self.fail_attachments = true;
        self
    }

    pub fn list_requests(&self) -> Vec<RecordedQuery> {
        self.list_requests.lock().expect("lock poisoned").clone()
    }

    pub fn attachment_requests(&self) -> Vec<String> {
        self.attachment_requests.lock().expect("lock poisoned").clone()
    }
}

fn upstream_error(operation: &'static str) -> SyncError {
    SyncError::UpstreamStatus {
        service: "memos",
        operation,
        status: 503,
        body: "unavailable".into(),
    }
}

#[async_trait]
impl MemoSource for FakeMemoSource {
    async fn list_memos(&self, query: &ListMemosQuery<'_>) -> SyncResult<MemoPage> {
        self.list_requests
            .lock()
            .expect("lock poisoned")
            .push(RecordedQuery {
                page_size: query.page_size,
                page_token: query.page_token.map(str::to_string),
                filter: query.filter.map(str::to_string),
            });
        if self.fail_listing {
            return Err(upstream_error("list memos"));
        }

        let index = query
            .page_token
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0);
        let memos = self.pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());
        Ok(MemoPage {
            memos,
            next_page_token,
        })
    }

    async fn list_attachments(&self, memo_short_id: &str) -> SyncResult<Value> {
        self.attachment_requests
            .lock()
            .expect("lock poisoned")
            .push(memo_short_id.to_string());
        if self.fail_attachments {
            return Err(upstream_error("list attachments"));
        }
        Ok(self
            .attachments
            .get(memo_short_id)
            .cloned()
            .unwrap_or(Value::Array(Vec::new())))
    }
}
