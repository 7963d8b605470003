use thiserror::Error;

/// Failures talking to the record backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response (connect failure, timeout,
    /// interrupted body).
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The response arrived but did not match the expected shape.
    #[error("backend response did not decode: {0}")]
    Decode(String),
}

const BODY_SNIPPET_LEN: usize = 200;

/// Trim an error body for logs and messages. Backends sometimes answer
/// with whole HTML pages.
pub(crate) fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
