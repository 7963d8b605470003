use async_trait::async_trait;

use vetdesk_types::api::{MessagePage, OutgoingMessage, SendReceipt};
use vetdesk_types::models::{ConnectedAccount, MailFolder};

use crate::error::MailError;

/// The seam between the session and whatever actually moves mail.
///
/// Production uses [`crate::HttpMailGateway`]; tests inject an in-memory
/// fake. Every call names the account it acts for, so one gateway serves
/// all connected accounts.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// One page of the account's folder. `page` starts at 0; the returned
    /// page says whether another follows.
    async fn fetch_messages(
        &self,
        account: &ConnectedAccount,
        folder: MailFolder,
        page: u32,
    ) -> Result<MessagePage, MailError>;

    async fn send_message(
        &self,
        account: &ConnectedAccount,
        outgoing: &OutgoingMessage,
    ) -> Result<SendReceipt, MailError>;

    async fn mark_read(
        &self,
        account: &ConnectedAccount,
        message_id: &str,
    ) -> Result<(), MailError>;
}
