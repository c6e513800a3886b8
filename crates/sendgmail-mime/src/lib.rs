//! # sendgmail-mime
//!
//! Single-part MIME entities for plain-text email.
//!
//! ## Features
//!
//! - **Message generation**: `text/plain` entities with a fixed header order,
//!   so identical input always serializes to identical bytes
//! - **Message parsing**: Reads the entities back (headers, transfer
//!   encoding, charset)
//! - **Encoding/Decoding**: Base64 (standard and URL-safe), RFC 2047 header
//!   words
//!
//! ## Quick Start
//!
//! ```
//! use sendgmail_mime::Message;
//!
//! let message = Message::text_plain("Hello, World!")
//!     .with_header("to", "recipient@example.com")?
//!     .with_header("subject", "Test")?;
//!
//! let bytes = message.to_bytes();
//! let parsed = Message::parse(&bytes)?;
//! assert_eq!(parsed.subject()?.as_deref(), Some("Test"));
//! assert_eq!(parsed.body_text()?, "Hello, World!");
//! # Ok::<(), sendgmail_mime::Error>(())
//! ```
//!
//! ### Transport encoding
//!
//! ```
//! use sendgmail_mime::encoding::{encode_base64_urlsafe, decode_base64_urlsafe};
//!
//! let raw = encode_base64_urlsafe(b"to: a@b.com\n\nhi");
//! assert_eq!(decode_base64_urlsafe(&raw)?, b"to: a@b.com\n\nhi");
//! # Ok::<(), sendgmail_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, TransferEncoding};
