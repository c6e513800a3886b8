//! Credential lifecycle: load, refresh, first-run bootstrap and re-registration.

use sendgmail_oauth::{AuthFlow, Credential};
use tracing::{debug, info, warn};

use crate::config::{CLIENT_SECRET_FILE, Config};
use crate::error::{Error, Result};
use crate::interaction::Interaction;
use crate::store::{CredentialCache, CredentialStore, DeleteOutcome};

/// Handle bound to one valid credential for the length of a command.
#[derive(Debug, Clone)]
pub struct AuthorizedSession {
    credential: Credential,
}

impl AuthorizedSession {
    /// Binds a session to `credential`.
    #[must_use]
    pub const fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// Returns the bound credential.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Returns the access token to present to the API.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.credential.access_token
    }
}

/// Where the session's credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from the cache and still valid.
    Cached,
    /// Loaded expired and refreshed.
    Refreshed,
    /// Obtained through the authorization flow.
    Bootstrapped,
}

/// Result of [`CredentialManager::acquire`].
#[derive(Debug, Clone)]
pub struct AcquireOutcome {
    /// Session bound to a valid credential.
    pub session: AuthorizedSession,
    /// What happened to the old credential, when a new profile was requested.
    pub deleted: Option<DeleteOutcome>,
    /// Where the credential came from.
    pub source: CredentialSource,
}

/// Produces authorized sessions from the cache, refreshing or bootstrapping
/// the credential as needed.
#[derive(Debug)]
pub struct CredentialManager<A, I, S = CredentialStore> {
    config: Config,
    store: S,
    auth: A,
    interaction: I,
}

impl<A: AuthFlow, I: Interaction> CredentialManager<A, I> {
    /// Creates a manager over the configured cache.
    pub fn new(config: Config, auth: A, interaction: I) -> Self {
        let store = CredentialStore::from_config(&config);
        Self::with_store(config, store, auth, interaction)
    }
}

impl<A: AuthFlow, I: Interaction, S: CredentialCache> CredentialManager<A, I, S> {
    /// Creates a manager over a caller-supplied cache.
    pub const fn with_store(config: Config, store: S, auth: A, interaction: I) -> Self {
        Self {
            config,
            store,
            auth,
            interaction,
        }
    }

    /// Returns the underlying credential store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Deletes the cached credential.
    ///
    /// A failed removal is logged and reported as [`DeleteOutcome::NotFound`]
    /// when no credential is left behind.
    ///
    /// # Errors
    ///
    /// Returns the removal error if the credential is still cached.
    pub fn forget(&self) -> Result<DeleteOutcome> {
        match self.store.delete() {
            Ok(outcome) => Ok(outcome),
            Err(e) if self.store.exists() => Err(e),
            Err(e) => {
                warn!(error = %e, "could not remove credential cache, continuing");
                Ok(DeleteOutcome::NotFound)
            }
        }
    }

    /// Returns a session bound to a valid credential.
    ///
    /// With `force_new` the cached credential is deleted first and a new
    /// one is obtained through the authorization flow.
    ///
    /// # Errors
    ///
    /// - [`Error::ClientSecretMissing`] if a bootstrap is needed and the
    ///   client secret is not in place after prompting
    /// - [`Error::Authorization`] if the authorization flow fails
    /// - [`Error::AuthRefreshFailed`] if an expired credential cannot be refreshed
    /// - [`Error::CredentialExpired`] if the new credential is already expired
    /// - I/O errors from the cache
    pub async fn acquire(&mut self, force_new: bool) -> Result<AcquireOutcome> {
        self.store.ensure_directory()?;

        let deleted = if force_new {
            Some(self.forget()?)
        } else {
            None
        };

        let cached = match self.store.load() {
            Ok(cached) => cached,
            Err(e @ Error::CorruptCredential { .. }) => {
                warn!(error = %e, "ignoring unreadable credential cache");
                None
            }
            Err(e) => return Err(e),
        };

        let (credential, source) = match cached {
            None => (self.bootstrap().await?, CredentialSource::Bootstrapped),
            Some(credential) if credential.is_expired() => {
                info!("credential expired, refreshing");
                let refreshed = self
                    .auth
                    .refresh(&credential)
                    .await
                    .map_err(Error::AuthRefreshFailed)?;
                (refreshed, CredentialSource::Refreshed)
            }
            Some(credential) => {
                debug!("using cached credential");
                return Ok(AcquireOutcome {
                    session: AuthorizedSession::new(credential),
                    deleted,
                    source: CredentialSource::Cached,
                });
            }
        };

        if credential.is_expired() {
            return Err(Error::CredentialExpired);
        }
        self.store.save(&credential)?;

        Ok(AcquireOutcome {
            session: AuthorizedSession::new(credential),
            deleted,
            source,
        })
    }

    async fn bootstrap(&mut self) -> Result<Credential> {
        let secret_path = self.config.client_secret_path();
        if !secret_path.is_file() {
            let message = format!(
                "Place {CLIENT_SECRET_FILE} in the following folder:\n{}",
                self.config.config_dir().display()
            );
            let confirmed = self.interaction.confirm(&message)?;
            if !confirmed || !secret_path.is_file() {
                return Err(Error::ClientSecretMissing {
                    path: secret_path.display().to_string(),
                });
            }
        }

        info!("no cached credential, starting authorization");
        self.auth.authorize().await.map_err(Error::Authorization)
    }
}
