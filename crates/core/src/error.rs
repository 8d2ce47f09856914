#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("failed to decode payload: {0}")]
    PayloadDecode(#[source] serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("{service} request failed ({operation}): {source}")]
    Transport {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} {operation} failed: {status} {body}")]
    UpstreamStatus {
        service: &'static str,
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("failed to decode {service} response ({operation}): {source}")]
    ResponseDecode {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Render an error and every `source()` below it, outermost first.
///
/// Used where callers want diagnostic detail rather than just the top-level message.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![format!("{err}")];
    let mut current = err.source();
    while let Some(source) = current {
        lines.push(format!("caused by: {source}"));
        current = source.source();
    }
    lines.join("\n")
}
