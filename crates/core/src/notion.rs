//! Notion API access for memo pages.

use crate::config::NotionConfig;
use crate::constants::{NOTION_MEMO_ID_PROPERTY, NOTION_VERSION};
use crate::http;
use crate::page::{Block, PageDraft, PageProperties};
use crate::SyncResult;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

const SERVICE: &str = "notion";

/// Write and lookup operations against the memo database.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Create a page with properties and body. Returns the new page id when reported.
    async fn create_page(&self, draft: &PageDraft) -> SyncResult<Option<String>>;

    /// Id of the first page whose memo-id property equals `memo_id`.
    async fn find_page_by_memo_id(&self, memo_id: &str) -> SyncResult<Option<String>>;

    async fn update_page_properties(
        &self,
        page_id: &str,
        properties: &PageProperties,
    ) -> SyncResult<()>;

    /// Append blocks after the page's existing children.
    async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> SyncResult<()>;
}

/// `PageStore` backed by the Notion REST API.
#[derive(Clone, Debug)]
pub struct NotionClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
    database_id: String,
}

#[derive(Deserialize)]
struct PageRef {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct QueryResults {
    #[serde(default)]
    results: Vec<PageRef>,
}

impl NotionClient {
    /// Fails when the token or database id is not configured.
    pub fn new(client: reqwest::Client, config: &NotionConfig) -> SyncResult<Self> {
        Ok(Self {
            client,
            api_base: config.api_base().to_string(),
            token: config.token()?.to_string(),
            database_id: config.database_id()?.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    fn create_body(&self, draft: &PageDraft) -> Value {
        json!({
            "parent": { "database_id": self.database_id },
            "properties": draft.properties.to_json(),
            "children": draft.children,
        })
    }
}

fn memo_id_filter(memo_id: &str) -> Value {
    json!({
        "filter": {
            "property": NOTION_MEMO_ID_PROPERTY,
            "rich_text": { "equals": memo_id }
        }
    })
}

#[async_trait]
impl PageStore for NotionClient {
    async fn create_page(&self, draft: &PageDraft) -> SyncResult<Option<String>> {
        let request = self
            .request(reqwest::Method::POST, "/pages")
            .json(&self.create_body(draft));
        let response = http::send(SERVICE, "create page", request).await?;
        let page: PageRef = http::json(SERVICE, "create page", response).await?;
        tracing::debug!(page_id = ?page.id, memo_id = %draft.properties.memo_id, "notion page created");
        Ok(page.id)
    }

    async fn find_page_by_memo_id(&self, memo_id: &str) -> SyncResult<Option<String>> {
        let path = format!("/databases/{}/query", self.database_id);
        let request = self
            .request(reqwest::Method::POST, &path)
            .json(&memo_id_filter(memo_id));
        let response = http::send(SERVICE, "query database", request).await?;
        let found: QueryResults = http::json(SERVICE, "query database", response).await?;
        Ok(found.results.into_iter().find_map(|page| page.id))
    }

    async fn update_page_properties(
        &self,
        page_id: &str,
        properties: &PageProperties,
    ) -> SyncResult<()> {
        let request = self
            .request(reqwest::Method::PATCH, &format!("/pages/{page_id}"))
            .json(&json!({ "properties": properties.to_json() }));
        http::send(SERVICE, "update page properties", request).await?;
        Ok(())
    }

    async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> SyncResult<()> {
        if blocks.is_empty() {
            return Ok(());
        }
        let request = self
            .request(reqwest::Method::PATCH, &format!("/blocks/{page_id}/children"))
            .json(&json!({ "children": blocks }));
        http::send(SERVICE, "append blocks", request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::memo::Memo;
    use crate::test_server::TestServer;
    use axum::http::{Method, StatusCode};
    use std::time::Duration;

    fn client_for(server: &TestServer) -> NotionClient {
        let config = NotionConfig::new(
            Some("secret".into()),
            Some("db-1".into()),
            Some(server.base.clone()),
        );
        let http = http::build_client(Duration::from_secs(5)).unwrap();
        NotionClient::new(http, &config).unwrap()
    }

    fn draft() -> PageDraft {
        let memo = Memo {
            name: Some("memos/3".into()),
            create_time: Some(json!({ "seconds": 1700000000 })),
            ..Memo::default()
        };
        PageDraft::new(&memo, "Hi", &["https://a/1.png".to_string()])
    }

    fn assert_notion_headers(request: &crate::test_server::RecordedRequest) {
        assert_eq!(request.header("authorization"), Some("Bearer secret"));
        assert_eq!(request.header("notion-version"), Some("2022-06-28"));
        assert_eq!(request.header("content-type"), Some("application/json"));
    }

    fn client() -> NotionClient {
        let config = NotionConfig::new(Some("secret".into()), Some("db-1".into()), None);
        let http = http::build_client(Duration::from_secs(5)).unwrap();
        NotionClient::new(http, &config).unwrap()
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let http = http::build_client(Duration::from_secs(5)).unwrap();
        let config = NotionConfig::new(None, Some("db".into()), None);
        assert!(NotionClient::new(http.clone(), &config).is_err());
        let config = NotionConfig::new(Some("t".into()), None, None);
        assert!(NotionClient::new(http, &config).is_err());
    }

    #[test]
    fn create_body_targets_database() {
        let memo = Memo {
            name: Some("memos/3".into()),
            create_time: Some(json!({ "seconds": 1700000000 })),
            ..Memo::default()
        };
        let draft = PageDraft::new(&memo, "Hi", &["https://a/1.png".to_string()]);
        let body = client().create_body(&draft);

        assert_eq!(body["parent"], json!({ "database_id": "db-1" }));
        assert_eq!(
            body["properties"]["Created"],
            json!({ "date": { "start": "2023-11-14T22:13:20.000Z" } })
        );
        assert_eq!(body["children"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn lookup_filters_on_memo_id_property() {
        assert_eq!(
            memo_id_filter("memos/9"),
            json!({ "filter": { "property": "Memos ID", "rich_text": { "equals": "memos/9" } } })
        );
    }

    #[tokio::test]
    async fn create_page_posts_draft() {
        let server = TestServer::fixed(StatusCode::OK, r#"{"object":"page","id":"page-abc"}"#).await;

        let page_id = client_for(&server).create_page(&draft()).await.unwrap();

        assert_eq!(page_id.as_deref(), Some("page-abc"));
        let request = &server.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/pages");
        assert_notion_headers(request);
        let body = request.json();
        assert_eq!(body["parent"], json!({ "database_id": "db-1" }));
        assert_eq!(body["properties"]["Memos ID"]["rich_text"][0]["text"]["content"], "memos/3");
        assert_eq!(body["children"][1]["image"]["external"]["url"], "https://a/1.png");
    }

    #[tokio::test]
    async fn find_page_queries_database_by_memo_id() {
        let server = TestServer::spawn(|request| {
            let memo_id = request.json()["filter"]["rich_text"]["equals"].clone();
            let body = if memo_id == "memos/1" {
                json!({ "results": [{ "id": "page-1" }, { "id": "page-2" }] })
            } else {
                json!({ "results": [] })
            };
            (StatusCode::OK, body.to_string())
        })
        .await;
        let client = client_for(&server);

        assert_eq!(
            client.find_page_by_memo_id("memos/1").await.unwrap().as_deref(),
            Some("page-1")
        );
        assert_eq!(client.find_page_by_memo_id("memos/2").await.unwrap(), None);

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/databases/db-1/query");
        assert_notion_headers(&requests[0]);
        assert_eq!(requests[0].json(), memo_id_filter("memos/1"));
    }

    #[tokio::test]
    async fn update_patches_properties_then_appends_children() {
        let server = TestServer::fixed(StatusCode::OK, "{}").await;
        let client = client_for(&server);
        let draft = draft();

        client
            .update_page_properties("page-9", &draft.properties)
            .await
            .unwrap();
        client.append_blocks("page-9", &draft.children).await.unwrap();
        client.append_blocks("page-9", &[]).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::PATCH);
        assert_eq!(requests[0].path, "/pages/page-9");
        assert_eq!(
            requests[0].json(),
            json!({ "properties": draft.properties.to_json() })
        );
        assert_eq!(requests[1].method, Method::PATCH);
        assert_eq!(requests[1].path, "/blocks/page-9/children");
        assert_notion_headers(&requests[1]);
        assert_eq!(requests[1].json()["children"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn rejected_request_reports_status_and_body() {
        let body = r#"{"object":"error","status":400,"code":"validation_error","message":"Name is not a property"}"#;
        let server = TestServer::fixed(StatusCode::BAD_REQUEST, body).await;

        let err = client_for(&server).create_page(&draft()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("notion create page failed: 400 {body}")
        );
        assert!(matches!(err, SyncError::UpstreamStatus { status: 400, .. }));
    }
}
