//! OAuth client secret file, as downloaded from the Google Cloud console.
//!
//! The file wraps the client under an `"installed"` key for desktop apps
//! or a `"web"` key for web apps:
//!
//! ```json
//! {"installed": {"client_id": "...", "client_secret": "...",
//!   "auth_uri": "https://accounts.google.com/o/oauth2/auth",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "redirect_uris": ["http://localhost"]}}
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Registered OAuth client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    /// Client ID.
    pub client_id: String,
    /// Client secret (absent for some public clients).
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Authorization endpoint.
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ClientSecret {
    /// Parses the JSON content of a client secret file.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has neither an
    /// `installed` nor a `web` section.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(json)?;
        let secret = file
            .installed
            .or(file.web)
            .ok_or_else(|| Error::InvalidConfig("missing \"installed\" or \"web\" section".into()))?;

        if secret.client_id.is_empty() {
            return Err(Error::InvalidConfig("empty client_id".into()));
        }
        Ok(secret)
    }

    /// Reads and parses a client secret file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientSecret`] naming the path on any failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let wrap = |reason: String| Error::ClientSecret {
            path: path.display().to_string(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| wrap(e.to_string()))?;
        Self::from_json(&json).map_err(|e| wrap(e.to_string()))
    }
}
