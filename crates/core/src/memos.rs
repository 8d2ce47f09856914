//! Memos API access: listing memos and a memo's attachments.

use crate::config::MemosEndpoint;
use crate::http;
use crate::memo::Memo;
use crate::SyncResult;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

const SERVICE: &str = "memos";

/// One page of the memo list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MemoPage {
    #[serde(default)]
    pub memos: Vec<Memo>,
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Parameters of a memo list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListMemosQuery<'a> {
    pub page_size: u32,
    pub page_token: Option<&'a str>,
    pub filter: Option<&'a str>,
}

impl ListMemosQuery<'_> {
    /// Query-string pairs; empty token and filter are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("pageSize", self.page_size.to_string())];
        if let Some(token) = self.page_token.filter(|t| !t.is_empty()) {
            pairs.push(("pageToken", token.to_string()));
        }
        if let Some(filter) = self.filter.filter(|f| !f.is_empty()) {
            pairs.push(("filter", filter.to_string()));
        }
        pairs
    }
}

/// Read access to memos.
#[async_trait]
pub trait MemoSource: Send + Sync {
    async fn list_memos(&self, query: &ListMemosQuery<'_>) -> SyncResult<MemoPage>;

    /// Raw `attachments` value for the memo with the given short id (`42` for `memos/42`).
    async fn list_attachments(&self, memo_short_id: &str) -> SyncResult<Value>;
}

/// `MemoSource` backed by the Memos REST API.
#[derive(Clone, Debug)]
pub struct MemosClient {
    client: reqwest::Client,
    endpoint: MemosEndpoint,
}

impl MemosClient {
    pub fn new(client: reqwest::Client, endpoint: MemosEndpoint) -> Self {
        Self { client, endpoint }
    }
}

#[derive(Deserialize)]
struct AttachmentList {
    #[serde(default)]
    attachments: Value,
}

#[async_trait]
impl MemoSource for MemosClient {
    async fn list_memos(&self, query: &ListMemosQuery<'_>) -> SyncResult<MemoPage> {
        let url = format!("{}/memos", self.endpoint.base);
        tracing::debug!(%url, page_token = ?query.page_token, "listing memos");

        let request = self
            .client
            .get(url)
            .bearer_auth(&self.endpoint.token)
            .query(&query.to_pairs());
        let response = http::send(SERVICE, "list memos", request).await?;
        http::json(SERVICE, "list memos", response).await
    }

    async fn list_attachments(&self, memo_short_id: &str) -> SyncResult<Value> {
        let url = format!("{}/memos/{}/attachments", self.endpoint.base, memo_short_id);
        tracing::debug!(%url, "listing memo attachments");

        let request = self.client.get(url).bearer_auth(&self.endpoint.token);
        let response = http::send(SERVICE, "list attachments", request).await?;
        let list: AttachmentList = http::json(SERVICE, "list attachments", response).await?;
        Ok(list.attachments)
    }
}
