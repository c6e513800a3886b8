//! `OAuth2` provider endpoints.

use crate::GMAIL_SCOPES;
use crate::error::{Error, Result};
use crate::secret::ClientSecret;
use url::Url;

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Google provider using the endpoints named in a client secret file.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints in the file are not valid URLs.
    pub fn from_client_secret(secret: &ClientSecret) -> Result<Self> {
        Ok(Self::new("Google", &secret.auth_uri, &secret.token_uri)?
            .with_default_scopes(GMAIL_SCOPES.iter().copied()))
    }

    /// Validates that the endpoints can carry credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is not `https` (plain `http` is
    /// accepted for loopback hosts only).
    pub fn validate(&self) -> Result<()> {
        for (label, url) in [("auth_url", &self.auth_url), ("token_url", &self.token_url)] {
            let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1"));
            if url.scheme() != "https" && !(url.scheme() == "http" && loopback) {
                return Err(Error::InvalidConfig(format!(
                    "{label} must use https: {url}"
                )));
            }
        }
        Ok(())
    }
}
