use thiserror::Error;

/// Failures talking to a mail/social provider gateway.
///
/// `Auth` is split out from `Status` so the session can disconnect just
/// the one account whose credential went stale instead of failing the
/// whole refresh.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider response did not decode: {0}")]
    Decode(String),
    #[error("provider rejected the credential ({status})")]
    Auth { status: u16 },
}

impl MailError {
    pub fn is_auth(&self) -> bool {
        matches!(self, MailError::Auth { .. })
    }
}
