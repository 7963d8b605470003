use thiserror::Error;
use uuid::Uuid;

use vetdesk_backend::BackendError;
use vetdesk_mail::MailError;
use vetdesk_types::validate::ValidationError;

/// Anything a session operation can surface to the shell.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A form failed its local presence checks; nothing was submitted.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error("no connected account {0}")]
    UnknownAccount(Uuid),
    #[error("account {0} is disconnected")]
    AccountInactive(Uuid),
}
