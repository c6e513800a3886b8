//! Installed-application flow: browser consent plus loopback redirect.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{info, warn};

use super::pkce::generate_state;
use super::{AuthFlow, AuthorizationCodeFlow, OAuthClient, RedirectListener};
use crate::error::Result;
use crate::provider::Provider;
use crate::secret::ClientSecret;
use crate::token::Credential;

/// Production [`AuthFlow`] backed by a client secret file on disk.
///
/// The client secret is read each time a flow runs, never at construction,
/// so the file may be put in place after the flow is created.
#[derive(Debug, Clone)]
pub struct InstalledAppFlow {
    client_secret_path: PathBuf,
    scopes: Vec<String>,
    open_browser: bool,
    http_client: Client,
}

impl InstalledAppFlow {
    /// Creates a flow for the given client secret file and scopes.
    #[must_use]
    pub fn new<I, S>(client_secret_path: impl Into<PathBuf>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client_secret_path: client_secret_path.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
            open_browser: true,
            http_client: Client::new(),
        }
    }

    /// Disables launching the system browser; the URL is only printed.
    #[must_use]
    pub const fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    /// Returns the client secret path.
    #[must_use]
    pub fn client_secret_path(&self) -> &Path {
        &self.client_secret_path
    }

    fn client(&self) -> Result<OAuthClient> {
        let secret = ClientSecret::from_file(&self.client_secret_path)?;
        let provider = Provider::from_client_secret(&secret)?.with_default_scopes(self.scopes.clone());
        provider.validate()?;

        let mut client =
            OAuthClient::new(secret.client_id, provider).with_http_client(self.http_client.clone());
        if let Some(client_secret) = secret.client_secret {
            client = client.with_client_secret(client_secret);
        }
        Ok(client)
    }
}

impl AuthFlow for InstalledAppFlow {
    async fn authorize(&self) -> Result<Credential> {
        let listener = RedirectListener::bind().await?;
        let client = self.client()?.with_redirect_uri(listener.redirect_uri());
        let flow = AuthorizationCodeFlow::new(client).with_pkce();

        let state = generate_state();
        let url = flow.authorization_url(None, Some(&state))?;

        println!("Please visit this URL to authorize this application: {url}");
        if self.open_browser {
            if let Err(e) = opener::open_browser(url.as_str()) {
                warn!("could not open a browser: {e}");
            }
        }

        let callback = listener.accept(&state).await?;
        let mut credential = flow.exchange_code(&callback.code, None).await?;
        if credential.scopes.is_empty() {
            credential.scopes.clone_from(&self.scopes);
        }

        info!("authorization completed");
        Ok(credential)
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        self.client()?.refresh_token(credential).await
    }
}
