//! Backfill: page through every memo and mirror it into Notion.
//!
//! Memos are processed strictly one at a time. A failure on one memo is recorded and the
//! run moves on; only a failure to list memos aborts the run. Existing pages are found by
//! their memo-id property, then skipped or, when enabled, updated. Updating appends the
//! freshly built body after the page's current blocks rather than replacing them.

use crate::attachments::extract_attachment_urls;
use crate::config::{BulkOptions, SyncConfig};
use crate::content::parse_memo_content;
use crate::error::{SyncError, SyncResult};
use crate::http::build_client;
use crate::memo::Memo;
use crate::memos::{ListMemosQuery, MemoSource, MemosClient};
use crate::notion::{NotionClient, PageStore};
use crate::page::{dedupe_urls, PageDraft};
use crate::storage_url::UrlRewriter;
use std::sync::Arc;

/// Result of syncing one memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoOutcome {
    Created,
    Updated,
    Skipped,
}

/// A memo that could not be synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub memo_id: String,
    pub error: String,
}

/// Totals for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    fn record(&mut self, outcome: MemoOutcome) {
        match outcome {
            MemoOutcome::Created => self.created += 1,
            MemoOutcome::Updated => self.updated += 1,
            MemoOutcome::Skipped => self.skipped += 1,
        }
    }
}

pub struct BulkSynchronizer {
    memos: Arc<dyn MemoSource>,
    store: Arc<dyn PageStore>,
    rewriter: UrlRewriter,
    options: BulkOptions,
}

impl BulkSynchronizer {
    pub fn new(
        memos: Arc<dyn MemoSource>,
        store: Arc<dyn PageStore>,
        rewriter: UrlRewriter,
        options: BulkOptions,
    ) -> Self {
        Self {
            memos,
            store,
            rewriter,
            options,
        }
    }

    /// Wire the synchronizer to the real APIs. Both Memos and Notion must be configured.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        let endpoint = config
            .memos
            .validate()
            .map_err(|errors| SyncError::InvalidConfig(errors.join("; ")))?;
        let client = build_client(config.http_timeout)?;
        let store = NotionClient::new(client.clone(), &config.notion)?;

        Ok(Self::new(
            Arc::new(MemosClient::new(client, endpoint)),
            Arc::new(store),
            UrlRewriter::new(config.public_domain.as_deref()),
            config.bulk.clone(),
        ))
    }

    /// Run the full pagination loop.
    ///
    /// # Errors
    ///
    /// Returns an error only if a memo list request fails; per-memo failures end up in
    /// [`SyncReport::failures`].
    pub async fn run(&self) -> SyncResult<SyncReport> {
        tracing::info!(
            filter = self.options.filter.as_deref().unwrap_or("(none)"),
            page_size = self.options.page_size,
            delay_ms = self.options.write_delay.as_millis() as u64,
            update_existing = self.options.update_existing,
            "starting bulk sync"
        );

        let mut report = SyncReport::default();
        let mut page_token: Option<String> = None;
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            let query = ListMemosQuery {
                page_size: self.options.page_size,
                page_token: page_token.as_deref(),
                filter: self.options.filter.as_deref(),
            };
            let page = self.memos.list_memos(&query).await?;
            tracing::info!(page = page_number, memos = page.memos.len(), "fetched memo page");

            for memo in &page.memos {
                report.processed += 1;
                match self.sync_memo(memo).await {
                    Ok(outcome) => report.record(outcome),
                    Err(e) => {
                        tracing::error!(memo_id = %memo.id(), error = %e, "memo sync failed");
                        report.failures.push(SyncFailure {
                            memo_id: memo.id().to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::info!(
            processed = report.processed,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failures.len(),
            "bulk sync finished"
        );
        Ok(report)
    }

    #[tracing::instrument(skip_all, fields(memo_id = %memo.id()))]
    async fn sync_memo(&self, memo: &Memo) -> SyncResult<MemoOutcome> {
        let parsed = parse_memo_content(memo.content.as_deref());
        let listed = extract_attachment_urls(&memo.attachments);
        let images = dedupe_urls(parsed.images.into_iter().chain(listed));
        let images = self.rewriter.rewrite_all(&images);
        tracing::debug!(images = images.len(), text_chars = parsed.text.chars().count(), "memo parsed");

        let existing = self.store.find_page_by_memo_id(memo.id()).await?;
        let draft = PageDraft::new(memo, &parsed.text, &images);

        let outcome = match existing {
            Some(page_id) if !self.options.update_existing => {
                tracing::info!(%page_id, "page exists, skipping");
                return Ok(MemoOutcome::Skipped);
            }
            Some(page_id) => {
                self.store
                    .update_page_properties(&page_id, &draft.properties)
                    .await?;
                self.store.append_blocks(&page_id, &draft.children).await?;
                tracing::info!(%page_id, "page updated");
                MemoOutcome::Updated
            }
            None => {
                let page_id = self.store.create_page(&draft).await?;
                tracing::info!(page_id = ?page_id, "page created");
                MemoOutcome::Created
            }
        };

        if !self.options.write_delay.is_zero() {
            tokio::time::sleep(self.options.write_delay).await;
        }
        Ok(outcome)
    }
}
