use clap::{Parser, Subcommand};
use memosync_core::attachments::extract_attachment_urls;
use memosync_core::content::parse_memo_content;
use memosync_core::page::dedupe_urls;
use memosync_core::{
    BulkOptions, BulkSynchronizer, PageDraft, SyncConfig, SyncReport, SyncResult, UrlRewriter,
    WebhookPayload,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "memosync")]
#[command(about = "Mirror Memos notes into a Notion database")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync every memo (matching the filter) into Notion
    BulkSync {
        /// Memos list filter expression (overrides MEMOS_FILTER)
        #[arg(long)]
        filter: Option<String>,
        /// Memos per list request (overrides MEMOS_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<u32>,
        /// Pause after each Notion write, in milliseconds (overrides NOTION_DELAY_MS)
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Update pages that already exist instead of skipping them
        #[arg(long)]
        update_existing: bool,
    },
    /// Show the Notion page a webhook payload would produce, without sending anything
    Preview {
        /// Path to a webhook payload JSON file
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("memosync=info".parse()?)
                .add_directive("memosync_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = SyncConfig::from_lookup(|key| std::env::var(key).ok())?;

    match cli.command {
        Some(Commands::BulkSync {
            filter,
            page_size,
            delay_ms,
            update_existing,
        }) => {
            let mut config = config;
            apply_overrides(&mut config.bulk, filter, page_size, delay_ms, update_existing);
            let synchronizer = BulkSynchronizer::from_config(&config)?;
            let report = synchronizer.run().await?;
            print_report(&report);
        }
        Some(Commands::Preview { payload }) => {
            let raw = std::fs::read(&payload)?;
            let payload: WebhookPayload = serde_json::from_slice(&raw)?;
            if !payload.is_memo_created() {
                println!("Not a memos.memo.created event; the webhook would ignore it.");
                return Ok(());
            }
            let rewriter = UrlRewriter::new(config.public_domain.as_deref());
            let body = preview(&payload, &rewriter)?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        None => {
            println!("Use 'memosync --help' for commands");
        }
    }

    Ok(())
}

fn apply_overrides(
    bulk: &mut BulkOptions,
    filter: Option<String>,
    page_size: Option<u32>,
    delay_ms: Option<u64>,
    update_existing: bool,
) {
    if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
        bulk.filter = Some(filter);
    }
    if let Some(page_size) = page_size {
        bulk.page_size = page_size;
    }
    if let Some(delay_ms) = delay_ms {
        bulk.write_delay = Duration::from_millis(delay_ms);
    }
    if update_existing {
        bulk.update_existing = true;
    }
}

/// Page properties and body for the memo in `payload`, from the payload alone.
///
/// Attachments are not re-fetched from Memos.
fn preview(payload: &WebhookPayload, rewriter: &UrlRewriter) -> SyncResult<Value> {
    let memo = payload.decode_memo()?;
    let parsed = parse_memo_content(memo.content.as_deref());
    let images = dedupe_urls(
        parsed
            .images
            .into_iter()
            .chain(extract_attachment_urls(&memo.attachments)),
    );
    let draft = PageDraft::new(&memo, &parsed.text, &rewriter.rewrite_all(&images));
    Ok(json!({
        "properties": draft.properties.to_json(),
        "children": draft.children,
    }))
}

fn print_report(report: &SyncReport) {
    println!("Processed: {}", report.processed);
    println!("Created:   {}", report.created);
    println!("Updated:   {}", report.updated);
    println!("Skipped:   {}", report.skipped);
    println!("Failed:    {}", report.failures.len());
    for failure in &report.failures {
        println!("  {}: {}", failure.memo_id, failure.error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment_options() {
        let mut bulk = BulkOptions {
            filter: Some("from env".into()),
            ..BulkOptions::default()
        };
        apply_overrides(&mut bulk, Some("tag in [\"x\"]".into()), Some(50), Some(0), true);
        assert_eq!(bulk.filter.as_deref(), Some("tag in [\"x\"]"));
        assert_eq!(bulk.page_size, 50);
        assert_eq!(bulk.write_delay, Duration::ZERO);
        assert!(bulk.update_existing);
    }

    #[test]
    fn absent_flags_keep_environment_options() {
        let mut bulk = BulkOptions {
            update_existing: true,
            ..BulkOptions::default()
        };
        apply_overrides(&mut bulk, None, None, None, false);
        assert_eq!(bulk.page_size, 10);
        assert_eq!(bulk.write_delay, Duration::from_millis(200));
        assert!(bulk.update_existing);
    }

    #[test]
    fn preview_builds_page_with_rewritten_images() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "activityType": "memos.memo.created",
            "memo": {
                "name": "memos/9",
                "content": "Trip ![p](https://b.acct.r2.cloudflarestorage.com/a.jpg)",
                "attachments": [{ "externalLink": "https://cdn.example/b.png" }],
                "createTime": 1700000000
            }
        }))
        .unwrap();
        let rewriter = UrlRewriter::new(Some("https://img.example.com"));

        let body = preview(&payload, &rewriter).expect("memo present");
        assert!(payload.is_memo_created());

        assert_eq!(
            body["properties"]["Name"]["title"][0]["text"]["content"],
            "Trip"
        );
        assert_eq!(
            body["properties"]["Created"]["date"]["start"],
            "2023-11-14T22:13:20.000Z"
        );
        let children = body["children"].as_array().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(
            children[1]["image"]["external"]["url"],
            "https://img.example.com/a.jpg"
        );
        assert_eq!(
            children[2]["image"]["external"]["url"],
            "https://cdn.example/b.png"
        );
    }

    #[test]
    fn preview_without_memo_is_an_error() {
        let payload: WebhookPayload =
            serde_json::from_value(json!({ "activityType": "memos.memo.created" })).unwrap();
        assert!(preview(&payload, &UrlRewriter::default()).is_err());
    }
}
