//! `OAuth2` authorization flows.

mod code;
mod installed;
mod loopback;
mod pkce;

pub use code::AuthorizationCodeFlow;
pub use installed::InstalledAppFlow;
pub use loopback::{Callback, RedirectListener};
pub use pkce::PkceChallenge;

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{Credential, ErrorResponse, TokenResponse};
use chrono::Utc;
use reqwest::Client;
use std::collections::HashMap;
use tracing::debug;

/// Source of fresh and refreshed credentials.
///
/// The production implementation is [`InstalledAppFlow`]; tests substitute
/// fakes that never touch the network.
#[allow(async_fn_in_trait)]
pub trait AuthFlow {
    /// Runs the interactive authorization and returns a new credential.
    async fn authorize(&self) -> Result<Credential>;

    /// Exchanges the credential's refresh token for a new access token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential>;
}

/// Common `OAuth2` client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI for authorization code flow.
    pub redirect_uri: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Reuses an existing HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Refreshes an access token using a refresh token.
    ///
    /// The refresh token and scopes of `credential` carry over when the
    /// server does not return new ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or if the credential has no
    /// refresh token.
    pub async fn refresh_token(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential.refresh_token()?;

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.client_id);

        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        let mut refreshed = self.token_request(&params).await?;
        refreshed.inherit_from(credential);
        debug!(expiry = ?refreshed.expiry, "access token refreshed");
        Ok(refreshed)
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub(crate) async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
    ) -> Result<Credential> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", &self.client_id);

        if let Some(uri) = redirect_uri.or(self.redirect_uri.as_deref()) {
            params.insert("redirect_uri", uri);
        }

        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        if let Some(verifier) = code_verifier {
            params.insert("code_verifier", verifier);
        }

        self.token_request(&params).await
    }

    /// POSTs a form to the token endpoint and decodes the reply.
    async fn token_request(&self, params: &HashMap<&str, &str>) -> Result<Credential> {
        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(serde_json::from_str::<ErrorResponse>(&body).map_or_else(
                |_| Error::InvalidResponse(format!("token endpoint returned {status}: {body}")),
                ErrorResponse::into_error,
            ));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)?;
        Credential::from_response(token_response, Utc::now())
    }
}
