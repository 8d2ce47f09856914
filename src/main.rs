use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use memosync_core::{SyncConfig, WebhookService};

/// Main entry point for the memosync webhook server
///
/// Serves the Memos webhook on `/` and `/webhook`, plus `/health` and the Swagger UI.
///
/// # Environment Variables
/// - `MEMOSYNC_ADDR`: listen address (default: "0.0.0.0:8787")
/// - `NOTION_TOKEN`, `NOTION_DATABASE_ID`: required Notion credentials
/// - `MEMOS_API_BASE`, `MEMOS_API_TOKEN`: enable the delayed attachment re-fetch
/// - `R2_PUBLIC_DOMAIN`: public domain for R2 image URLs
/// - `WEBHOOK_ATTACHMENT_DELAY_MS`: wait before the re-fetch (default: 10000)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("memosync_run=info".parse()?)
                .add_directive("memosync_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SyncConfig::from_lookup(|key| std::env::var(key).ok())?;
    let webhook = WebhookService::from_config(&config)?;

    tracing::info!("++ Starting memosync webhook on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, router(AppState::new(webhook))).await?;

    Ok(())
}
