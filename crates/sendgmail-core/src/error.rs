//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No credential is cached.
    #[error("No cached credential")]
    CredentialAbsent,

    /// The credential is expired and was not refreshed.
    #[error("Credential is expired")]
    CredentialExpired,

    /// The credential cache exists but cannot be read back.
    #[error("Corrupt credential cache {path}: {reason}")]
    CorruptCredential {
        /// Cache file path.
        path: String,
        /// Why deserialization failed.
        reason: String,
    },

    /// Refreshing an expired credential failed.
    #[error("Failed to refresh credential: {0}")]
    AuthRefreshFailed(#[source] sendgmail_oauth::Error),

    /// The first-run authorization flow failed.
    #[error("Authorization failed: {0}")]
    Authorization(#[source] sendgmail_oauth::Error),

    /// The OAuth client secret file is not in place.
    #[error("Client secret file not found: {path}")]
    ClientSecretMissing {
        /// Expected location of the file.
        path: String,
    },

    /// The Gmail API answered with an error.
    #[error("Gmail API error ({status}): {message}")]
    RemoteApi {
        /// HTTP status code.
        status: u16,
        /// Message reported by the API.
        message: String,
    },

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The message could not be built.
    #[error("Message error: {0}")]
    Mime(#[from] sendgmail_mime::Error),

    /// Malformed API URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Subject, recipient or message body was not given.
    #[error("Please make sure subject, recipient and message are included")]
    MissingArguments,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
