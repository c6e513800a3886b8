//! # sendgmail-oauth
//!
//! `OAuth2` support for the `sendgmail` command-line tool.
//!
//! ## Features
//!
//! - **Installed-app flow**: Authorization Code Flow with PKCE, redirect
//!   captured by a one-shot loopback listener on an ephemeral port
//! - **Token refresh**: Exchanges a refresh token for a new access token
//! - **Client secrets**: Parses the OAuth client JSON downloaded from the
//!   Google Cloud console
//! - **Credential**: Serializable token bundle with expiry checking
//!
//! ## Quick Start
//!
//! ```ignore
//! use sendgmail_oauth::{AuthFlow, InstalledAppFlow, GMAIL_SCOPES};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let flow = InstalledAppFlow::new("credentials.json", GMAIL_SCOPES.iter().copied());
//!
//!     // Opens the browser and waits for the redirect
//!     let credential = flow.authorize().await?;
//!
//!     if credential.is_expired() {
//!         let credential = flow.refresh(&credential).await?;
//!         println!("Refreshed: {}", credential.access_token);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod secret;
pub mod token;

pub use error::{Error, Result};
pub use flow::{
    AuthFlow, AuthorizationCodeFlow, InstalledAppFlow, OAuthClient, PkceChallenge,
    RedirectListener,
};
pub use provider::Provider;
pub use secret::ClientSecret;
pub use token::Credential;

/// Scopes requested by `sendgmail`: send mail and read the profile.
pub const GMAIL_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.readonly",
];
