//! Single-memo sync triggered by a Memos webhook.
//!
//! The webhook path always creates a page; unlike the bulk path it never looks for an
//! existing page first. Attachment URLs are gathered from the memo content, the payload
//! and a delayed second fetch from Memos, because the created event can arrive before
//! Memos has generated external links for freshly uploaded files.

use crate::attachments::extract_attachment_urls;
use crate::config::SyncConfig;
use crate::constants::MEMO_CREATED_ACTIVITY;
use crate::content::parse_memo_content;
use crate::error::{SyncError, SyncResult};
use crate::http::build_client;
use crate::memo::Memo;
use crate::memos::{MemoSource, MemosClient};
use crate::notion::{NotionClient, PageStore};
use crate::page::{dedupe_urls, PageDraft};
use crate::storage_url::UrlRewriter;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Incoming webhook body.
///
/// Both fields stay raw JSON until the event type is known, so events this bridge does
/// not handle are ignored whatever shape the rest of the body has.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, rename = "activityType")]
    pub activity_type: Option<Value>,
    #[serde(default)]
    pub memo: Option<Value>,
}

impl WebhookPayload {
    /// The event type, when it is a string.
    pub fn activity_type(&self) -> Option<&str> {
        self.activity_type.as_ref().and_then(Value::as_str)
    }

    pub fn is_memo_created(&self) -> bool {
        self.activity_type() == Some(MEMO_CREATED_ACTIVITY)
    }

    /// Decode the memo carried by the event.
    pub fn decode_memo(&self) -> SyncResult<Memo> {
        let memo = self
            .memo
            .as_ref()
            .filter(|memo| !memo.is_null())
            .ok_or_else(|| SyncError::InvalidPayload("memo.created event without memo".into()))?;
        Memo::deserialize(memo).map_err(SyncError::PayloadDecode)
    }
}

/// What the webhook did with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event type is not one this bridge handles.
    Ignored { activity_type: Option<String> },
    Synced {
        memo_id: String,
        images_count: usize,
        page_id: Option<String>,
    },
}

/// Processes created-memo events into new Notion pages.
#[derive(Clone)]
pub struct WebhookService {
    store: Arc<dyn PageStore>,
    memos: Option<Arc<dyn MemoSource>>,
    rewriter: UrlRewriter,
    attachment_delay: Duration,
}

impl WebhookService {
    /// `memos` is `None` when the Memos API is not (validly) configured; the delayed
    /// attachment fetch is then skipped.
    pub fn new(
        store: Arc<dyn PageStore>,
        memos: Option<Arc<dyn MemoSource>>,
        rewriter: UrlRewriter,
        attachment_delay: Duration,
    ) -> Self {
        Self {
            store,
            memos,
            rewriter,
            attachment_delay,
        }
    }

    /// Wire the service to the real Notion and Memos APIs.
    ///
    /// Missing Notion credentials are an error. An invalid Memos configuration only
    /// disables the delayed attachment fetch.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        let client = build_client(config.http_timeout)?;
        let store = NotionClient::new(client.clone(), &config.notion)?;
        let memos = match config.memos.validate() {
            Ok(endpoint) => {
                Some(Arc::new(MemosClient::new(client, endpoint)) as Arc<dyn MemoSource>)
            }
            Err(errors) => {
                tracing::warn!(?errors, "memos API config invalid, attachment fetch disabled");
                None
            }
        };

        Ok(Self::new(
            Arc::new(store),
            memos,
            UrlRewriter::new(config.public_domain.as_deref()),
            config.attachment_delay,
        ))
    }

    /// Decode a raw request body and process it.
    pub async fn handle_body(&self, body: &[u8]) -> SyncResult<WebhookOutcome> {
        let payload: WebhookPayload =
            serde_json::from_slice(body).map_err(SyncError::PayloadDecode)?;
        self.handle(payload).await
    }

    #[tracing::instrument(skip_all, fields(activity_type = ?payload.activity_type))]
    pub async fn handle(&self, payload: WebhookPayload) -> SyncResult<WebhookOutcome> {
        if !payload.is_memo_created() {
            tracing::info!("ignoring webhook event");
            return Ok(WebhookOutcome::Ignored {
                activity_type: payload.activity_type().map(str::to_string),
            });
        }

        let memo = payload.decode_memo()?;
        let memo_id = memo.id().to_string();

        let parsed = parse_memo_content(memo.content.as_deref());
        let payload_images = extract_attachment_urls(&memo.attachments);
        let fetched_images = self.refetch_attachment_images(&memo).await;
        tracing::info!(
            memo_id = %memo_id,
            content_images = parsed.images.len(),
            payload_images = payload_images.len(),
            fetched_images = fetched_images.len(),
            "collected memo images"
        );

        let images = dedupe_urls(
            parsed
                .images
                .into_iter()
                .chain(payload_images)
                .chain(fetched_images),
        );
        let images = self.rewriter.rewrite_all(&images);

        let draft = PageDraft::new(&memo, &parsed.text, &images);
        tracing::debug!(
            memo_id = %memo_id,
            blocks = draft.children.len(),
            title = %draft.properties.title,
            "creating notion page"
        );
        let page_id = self.store.create_page(&draft).await?;
        tracing::info!(memo_id = %memo_id, page_id = ?page_id, images = images.len(), "memo synced");

        Ok(WebhookOutcome::Synced {
            memo_id,
            images_count: images.len(),
            page_id,
        })
    }

    /// Wait, then ask Memos for the memo's attachments. Any failure contributes no URLs.
    async fn refetch_attachment_images(&self, memo: &Memo) -> Vec<String> {
        let Some(short_id) = memo.short_id() else {
            tracing::warn!("memo has no name, skipping attachment fetch");
            return Vec::new();
        };
        let Some(memos) = &self.memos else {
            tracing::warn!(memo_id = %memo.id(), "memos API not configured, skipping attachment fetch");
            return Vec::new();
        };

        if !self.attachment_delay.is_zero() {
            tracing::debug!(delay_ms = self.attachment_delay.as_millis() as u64, "waiting before attachment fetch");
            tokio::time::sleep(self.attachment_delay).await;
        }

        match memos.list_attachments(short_id).await {
            Ok(attachments) => extract_attachment_urls(&attachments),
            Err(e) => {
                tracing::warn!(memo_id = %memo.id(), error = %e, "attachment fetch failed");
                Vec::new()
            }
        }
    }
}
