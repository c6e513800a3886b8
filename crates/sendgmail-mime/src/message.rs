//! Single-part MIME message structure.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable, encode_base64_wrapped};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII. Also stands in for `8bit` and `binary`, which need no
    /// decoding either.
    SevenBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parses transfer encoding from string; anything without a decoding
    /// step means 7bit.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// Single-part MIME message: a header block and an encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Body as it appears on the wire (already transfer-encoded).
    pub body: Vec<u8>,
}

impl Message {
    /// Creates a message from headers and an already-encoded body.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Creates a `text/plain` message.
    ///
    /// ASCII text is sent as `charset="us-ascii"` with 7bit transfer
    /// encoding. Anything else is sent as `charset="utf-8"` in base64.
    /// The first three headers are always `Content-Type`, `MIME-Version`
    /// and `Content-Transfer-Encoding`, in that order.
    #[must_use]
    pub fn text_plain(text: &str) -> Self {
        let (charset, encoding, body) = if text.is_ascii() {
            ("us-ascii", TransferEncoding::SevenBit, text.as_bytes().to_vec())
        } else {
            (
                "utf-8",
                TransferEncoding::Base64,
                encode_base64_wrapped(text.as_bytes()).into_bytes(),
            )
        };

        let mut headers = Headers::new();
        headers.push("Content-Type", ContentType::text_plain(charset).to_string());
        headers.push("MIME-Version", "1.0");
        headers.push("Content-Transfer-Encoding", encoding.to_string());

        Self::new(headers, body)
    }

    /// Appends a header, applying RFC 2047 encoding to the value if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the value spans several lines.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        if value.contains(['\r', '\n']) {
            return Err(Error::InvalidHeader(format!("{name} must be a single line")));
        }
        self.headers.add(name, Headers::encode_value(value))?;
        Ok(self)
    }

    /// Parses a message from its serialized form.
    ///
    /// The header block ends at the first empty line (`\n\n` or `\r\n\r\n`).
    ///
    /// # Errors
    ///
    /// Returns an error if the header block is not valid UTF-8 or malformed.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (head, body) = split_head(raw);
        let head = std::str::from_utf8(head)
            .map_err(|e| Error::Parse(format!("header block is not UTF-8: {e}")))?;
        Ok(Self::new(Headers::parse(head)?, body.to_vec()))
    }

    /// Serializes the message: headers, an empty line, then the body.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.headers.to_string().into_bytes();
        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out
    }

    /// Gets the content type (`text/plain` when absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain("us-ascii")), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Gets the decoded To header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header has malformed encoded words.
    pub fn to(&self) -> Result<Option<String>> {
        self.headers.get_decoded("to")
    }

    /// Gets the decoded Subject header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header has malformed encoded words.
    pub fn subject(&self) -> Result<Option<String>> {
        self.headers.get_decoded("subject")
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => {
                Ok(decode_quoted_printable(&String::from_utf8_lossy(&self.body))?.into_bytes())
            }
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the decoded body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or UTF-8 conversion fails.
    pub fn body_text(&self) -> Result<String> {
        String::from_utf8(self.decode_body()?).map_err(Into::into)
    }
}

/// Splits raw bytes at the first blank line.
fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    let lf = raw.windows(2).position(|w| w == b"\n\n").map(|i| (i + 1, i + 2));
    let crlf = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i + 2, i + 4));

    let split = match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((head_end, body_start)) => (&raw[..head_end], &raw[body_start..]),
        None => (raw, &[]),
    }
}
