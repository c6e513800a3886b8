//! # sendgmail-core
//!
//! Core logic for the `sendgmail` command-line tool.
//!
//! This crate provides:
//! - **Credential Store** - versioned, atomically replaced token cache on disk
//! - **Credential Lifecycle** - load, refresh, first-run bootstrap, forced re-registration
//! - **Message Builder** - deterministic plain-text MIME entity, URL-safe base64
//! - **Gmail service** - profile lookup and message send over the REST API
//! - **Command Dispatch** - whoami / new profile / send flows
//!
//! The OAuth flow, the mail API and the operator prompt are traits
//! ([`AuthFlow`], [`MailApi`], [`Interaction`]) so the flows can run
//! against fakes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
mod error;
pub mod gmail;
pub mod interaction;
pub mod lifecycle;
pub mod message;
pub mod store;

pub use config::Config;
pub use dispatch::{Command, Outcome, run};
pub use error::{Error, Result};
pub use gmail::{GmailClient, MailApi, Profile, Receipt};
pub use interaction::{ConsoleInteraction, Interaction};
pub use lifecycle::{AcquireOutcome, AuthorizedSession, CredentialManager, CredentialSource};
pub use message::OutboundMessage;
pub use store::{CredentialCache, CredentialStore, DeleteOutcome};

pub use sendgmail_oauth::{AuthFlow, Credential};
