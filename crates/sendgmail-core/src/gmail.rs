//! Gmail REST API client.

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::lifecycle::AuthorizedSession;
use crate::message::OutboundMessage;

/// Gmail API base URL.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/";

/// Profile of the authenticated mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Mailbox address.
    pub email_address: String,
    /// Total number of messages.
    #[serde(default)]
    pub messages_total: u64,
    /// Total number of threads.
    #[serde(default)]
    pub threads_total: u64,
    /// Current history record id.
    #[serde(default)]
    pub history_id: Option<String>,
}

/// Identifiers of a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Message id.
    pub id: String,
    /// Thread the message was filed under.
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Labels applied to the message.
    #[serde(default)]
    pub label_ids: Vec<String>,
}

/// Remote mail operations.
#[allow(async_fn_in_trait)]
pub trait MailApi {
    /// Fetches the profile of the authenticated user.
    async fn get_profile(&self, session: &AuthorizedSession) -> Result<Profile>;

    /// Sends one message as the authenticated user.
    async fn send_message(
        &self,
        session: &AuthorizedSession,
        message: &OutboundMessage,
    ) -> Result<Receipt>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`MailApi`] over the Gmail REST API.
#[derive(Debug, Clone)]
pub struct GmailClient {
    base_url: String,
    http_client: Client,
}

impl GmailClient {
    /// Creates a client for the public Gmail API.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: GMAIL_API_BASE.to_string(),
            http_client: Client::new(),
        }
    }

    /// Points the client at another API root (must end with `/`).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reuses an existing HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?.join(path)?)
    }
}

impl Default for GmailClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MailApi for GmailClient {
    async fn get_profile(&self, session: &AuthorizedSession) -> Result<Profile> {
        let url = self.endpoint("users/me/profile")?;
        debug!(%url, "fetching profile");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(session.access_token())
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn send_message(
        &self,
        session: &AuthorizedSession,
        message: &OutboundMessage,
    ) -> Result<Receipt> {
        let url = self.endpoint("users/me/messages/send")?;
        debug!(%url, to = message.to(), "sending message");

        let response = self
            .http_client
            .post(url)
            .bearer_auth(session.access_token())
            .json(&SendRequest { raw: message.raw() })
            .send()
            .await?;
        let receipt: Receipt = check(response).await?.json().await?;
        debug!(id = %receipt.id, "message sent");
        Ok(receipt)
    }
}

/// Turns a non-2xx response into [`Error::RemoteApi`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.trim().to_string()
            }
        });

    Err(Error::RemoteApi {
        status: status.as_u16(),
        message,
    })
}
