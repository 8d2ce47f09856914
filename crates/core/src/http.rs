//! Shared outbound HTTP plumbing for the Memos and Notion clients.

use crate::{SyncError, SyncResult};
use std::time::Duration;

/// Build the client both upstream APIs share.
pub fn build_client(timeout: Duration) -> SyncResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(SyncError::HttpClient)
}

/// Send a request, mapping transport failures and non-success statuses to `SyncError`.
///
/// On a non-success status the response body text is captured for the error message.
pub(crate) async fn send(
    service: &'static str,
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> SyncResult<reqwest::Response> {
    let response = request
        .send()
        .await
        .map_err(|source| SyncError::Transport {
            service,
            operation,
            source,
        })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SyncError::UpstreamStatus {
        service,
        operation,
        status: status.as_u16(),
        body,
    })
}

/// Decode a JSON response body.
pub(crate) async fn json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    operation: &'static str,
    response: reqwest::Response,
) -> SyncResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|source| SyncError::ResponseDecode {
            service,
            operation,
            source,
        })
}
