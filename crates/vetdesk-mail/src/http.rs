use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use vetdesk_types::api::{MessagePage, OutgoingMessage, SendReceipt};
use vetdesk_types::models::{ConnectedAccount, MailFolder};

use crate::error::MailError;
use crate::provider::MailProvider;

/// [`MailProvider`] over the provider REST gateway. Auth is per account:
/// each request carries that account's own bearer credential.
#[derive(Debug, Clone)]
pub struct HttpMailGateway {
    http: Client,
    base_url: String,
    page_size: u32,
}

impl HttpMailGateway {
    pub fn new(base_url: impl Into<String>, page_size: u32) -> Self {
        Self::with_client(Client::new(), base_url, page_size)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, page_size: u32) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http,
            base_url,
            page_size,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn recv<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, MailError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| MailError::Decode(e.to_string()))
    }
}

/// 401/403 mean the stored credential is no good; everything else non-2xx
/// is an ordinary failed call.
fn status_error(status: StatusCode, body: &str) -> MailError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MailError::Auth {
            status: status.as_u16(),
        },
        _ => MailError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        },
    }
}

#[async_trait]
impl MailProvider for HttpMailGateway {
    async fn fetch_messages(
        &self,
        account: &ConnectedAccount,
        folder: MailFolder,
        page: u32,
    ) -> Result<MessagePage, MailError> {
        debug!(
            "mail fetch: account={} folder={} page={}",
            account.address,
            folder.as_str(),
            page
        );
        let resp = self
            .http
            .get(self.url(&format!(
                "/accounts/{}/folders/{}/messages",
                account.id,
                folder.as_str()
            )))
            .query(&[("page", page), ("page_size", self.page_size)])
            .header("Authorization", format!("Bearer {}", account.access_token))
            .send()
            .await?;
        Self::recv(resp).await
    }

    async fn send_message(
        &self,
        account: &ConnectedAccount,
        outgoing: &OutgoingMessage,
    ) -> Result<SendReceipt, MailError> {
        debug!("mail send: account={} to={:?}", account.address, outgoing.to);
        let resp = self
            .http
            .post(self.url(&format!("/accounts/{}/messages", account.id)))
            .header("Authorization", format!("Bearer {}", account.access_token))
            .json(outgoing)
            .send()
            .await?;
        Self::recv(resp).await
    }

    async fn mark_read(
        &self,
        account: &ConnectedAccount,
        message_id: &str,
    ) -> Result<(), MailError> {
        let resp = self
            .http
            .post(self.url(&format!(
                "/accounts/{}/messages/{}/read",
                account.id, message_id
            )))
            .header("Authorization", format!("Bearer {}", account.access_token))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(())
    }
}
