//! # API REST
//!
//! HTTP surface of the memosync webhook service.
//!
//! Handles:
//! - The Memos webhook endpoint (`POST /` and `POST /webhook`)
//! - Health checks and OpenAPI/Swagger documentation
//! - REST-specific concerns (status codes, JSON bodies, CORS)
//!
//! Event processing itself lives in `memosync-core`.

#![warn(rust_2018_idioms)]

use api_shared::{ErrorRes, HealthRes, HealthService, IgnoredRes, SyncedRes};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use memosync_core::{WebhookOutcome, WebhookService};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    webhook: Arc<WebhookService>,
}

impl AppState {
    pub fn new(webhook: WebhookService) -> Self {
        Self {
            webhook: Arc::new(webhook),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, receive_webhook),
    components(schemas(HealthRes, SyncedRes, IgnoredRes, ErrorRes))
)]
struct ApiDoc;

/// Build the application router.
///
/// The webhook is served on both `/` and `/webhook`; any method other than `POST` on
/// those paths gets a plain-text 405 without the body being read.
pub fn router(state: AppState) -> Router {
    let webhook = post(receive_webhook).fallback(method_not_allowed);

    Router::new()
        .route("/", webhook.clone())
        .route("/webhook", webhook)
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used by monitors and load balancers.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/webhook",
    request_body(
        content = String,
        content_type = "application/json",
        description = "Memos webhook payload with `activityType` and `memo`"
    ),
    responses(
        (status = 200, description = "Memo synced to a new Notion page", body = SyncedRes),
        (status = 200, description = "Event type ignored", body = IgnoredRes),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Processing failed", body = ErrorRes)
    )
)]
/// Receive a Memos webhook event.
///
/// Only `memos.memo.created` events are processed; the memo is mirrored into a new page.
/// Failures are reported as `500` with the error message and its cause chain.
#[axum::debug_handler]
async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    match state.webhook.handle_body(&body).await {
        Ok(WebhookOutcome::Ignored { .. }) => Json(IgnoredRes::default()).into_response(),
        Ok(WebhookOutcome::Synced {
            memo_id,
            images_count,
            ..
        }) => Json(SyncedRes::new(memo_id, images_count)).into_response(),
        Err(e) => {
            tracing::error!("Webhook processing error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorRes::from(&e))).into_response()
        }
    }
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use http_body_util::BodyExt;
    use memosync_core::testing::{RecordingPageStore, StoreCall};
    use memosync_core::{Block, UrlRewriter};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt; // for `oneshot`

    fn app(store: Arc<RecordingPageStore>) -> Router {
        let webhook = WebhookService::new(store, None, UrlRewriter::default(), Duration::ZERO);
        router(AppState::new(webhook))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes()
            .to_vec();
        (status, body)
    }

    #[tokio::test]
    async fn created_event_creates_page_and_reports_images() {
        let store = Arc::new(RecordingPageStore::default());
        let request = post_json(
            "/",
            json!({
                "activityType": "memos.memo.created",
                "memo": { "name": "memos/101", "content": "Hello ![x](http://img/a.png)\nWorld" }
            }),
        );

        let (status, body) = send(app(store.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({ "status": "success", "memo_id": "memos/101", "images_count": 1 })
        );

        let drafts = store.created();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].properties.title, "Hello\nWorld");
        assert_eq!(drafts[0].properties.memo_id, "memos/101");
        assert_eq!(
            drafts[0].children,
            vec![
                Block::paragraph("Hello"),
                Block::paragraph("World"),
                Block::external_image("http://img/a.png"),
            ]
        );
    }

    #[tokio::test]
    async fn webhook_path_is_an_alias() {
        let store = Arc::new(RecordingPageStore::default());
        let request = post_json(
            "/webhook",
            json!({ "activityType": "memos.memo.created", "memo": { "name": "memos/1" } }),
        );

        let (status, _) = send(app(store.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.created().len(), 1);
    }

    #[tokio::test]
    async fn other_events_are_ignored() {
        let store = Arc::new(RecordingPageStore::default());
        let request = post_json(
            "/",
            json!({ "activityType": "memos.memo.deleted", "memo": { "name": "memos/1" } }),
        );

        let (status, body) = send(app(store.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "status": "ignored" }));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn non_post_methods_are_rejected() {
        let store = Arc::new(RecordingPageStore::default());
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let request = Request::builder()
                .method(method.clone())
                .uri("/")
                .body(Body::empty())
                .unwrap();

            let (status, body) = send(app(store.clone()), request).await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(body, b"Method not allowed");
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_json_is_a_server_error_with_detail() {
        let store = Arc::new(RecordingPageStore::default());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(app(store), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorRes = serde_json::from_slice(&body).unwrap();
        assert!(body.error.starts_with("failed to decode payload"));
        assert!(body.stack.contains("caused by"));
    }

    #[tokio::test]
    async fn notion_failure_is_reported_as_500() {
        let store = Arc::new(RecordingPageStore::default().failing_for("memos/7"));
        let request = post_json(
            "/",
            json!({ "activityType": "memos.memo.created", "memo": { "name": "memos/7", "content": "x" } }),
        );

        let (status, body) = send(app(store.clone()), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorRes = serde_json::from_slice(&body).unwrap();
        assert!(body.error.contains("500"));
        assert!(matches!(store.calls()[0], StoreCall::Create(_)));
    }

    #[tokio::test]
    async fn health_reports_alive() {
        let store = Arc::new(RecordingPageStore::default());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(app(store), request).await;

        assert_eq!(status, StatusCode::OK);
        let body: HealthRes = serde_json::from_slice(&body).unwrap();
        assert!(body.ok);
    }
}
