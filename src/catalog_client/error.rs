use thiserror::Error;

/// Failures talking to the catalog Web API. All of them abort the current
/// ingestion unit; nothing is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Authentication rejected with status {0}")]
    Auth(u16),

    #[error("Rate limited by the catalog API (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid {kind} record '{id}': {reason}")]
    InvalidRecord {
        kind: &'static str,
        id: String,
        reason: String,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;
