//! MIME encoding and decoding utilities.
//!
//! Supports Base64 (standard, line-wrapped and URL-safe), Quoted-Printable
//! decoding, and RFC 2047 header encoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};

/// Maximum line length for body encodings (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Largest UTF-8 chunk per encoded word; 45 bytes encode to 60 characters,
/// which keeps `=?utf-8?b?...?=` within the 75 character limit.
const MAX_WORD_BYTES: usize = 45;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes a body as Base64 wrapped at 76 columns, each line ending in `\n`.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH + 1);
    for line in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        // base64 output is pure ASCII
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out
}

/// Encodes data with the URL-safe alphabet (`-` and `_`), padded.
///
/// This is the form the Gmail API expects in a message's `raw` field.
#[must_use]
pub fn encode_base64_urlsafe(data: &[u8]) -> String {
    URL_SAFE.encode(data)
}

/// Decodes URL-safe Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid URL-safe Base64.
pub fn decode_base64_urlsafe(data: &str) -> Result<Vec<u8>> {
    URL_SAFE.decode(data).map_err(Into::into)
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences or the
/// decoded bytes are not UTF-8.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            result.push(bytes[i]);
            i += 1;
            continue;
        }

        // Soft line break
        match bytes.get(i + 1..) {
            Some([b'\r', b'\n', ..]) => {
                i += 3;
                continue;
            }
            Some([b'\n', ..]) => {
                i += 2;
                continue;
            }
            _ => {}
        }

        let hex = bytes
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        let hex = std::str::from_utf8(hex)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        let byte = u8::from_str_radix(hex, 16)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        result.push(byte);
        i += 3;
    }

    String::from_utf8(result).map_err(Into::into)
}

/// Returns true if a header value must be written as RFC 2047 words to
/// survive a write/parse cycle unchanged.
#[must_use]
pub fn needs_rfc2047(text: &str) -> bool {
    !text.is_ascii()
        || text.contains("=?")
        || text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
}

/// Encodes a header value using RFC 2047 `B` encoding if needed.
///
/// Long values are split into several encoded words separated by a space;
/// words never split a UTF-8 character.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_rfc2047(text) {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        let next = idx + ch.len_utf8();
        if next - start > MAX_WORD_BYTES && end > start {
            words.push(&text[start..end]);
            start = end;
        }
        end = next;
    }
    if end > start || words.is_empty() {
        words.push(&text[start..end]);
    }

    words
        .iter()
        .map(|w| format!("=?{charset}?b?{}?=", encode_base64(w.as_bytes())))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes a single encoded word `=?charset?encoding?text?=`.
fn decode_word(word: &str) -> Result<String> {
    let inner = word
        .strip_prefix("=?")
        .and_then(|w| w.strip_suffix("?="))
        .ok_or_else(|| Error::InvalidEncoding(format!("Not an encoded word: {word}")))?;

    let parts: Vec<&str> = inner.split('?').collect();
    let [_charset, encoding, encoded_text] = parts.as_slice() else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    match encoding.to_ascii_uppercase().as_str() {
        "B" => Ok(String::from_utf8(decode_base64(encoded_text)?)?),
        "Q" => decode_quoted_printable(&encoded_text.replace('_', " ")),
        other => Err(Error::InvalidEncoding(format!("Unknown encoding: {other}"))),
    }
}

/// Decodes an RFC 2047 header value.
///
/// A value made only of encoded words is decoded and concatenated (the
/// whitespace between adjacent encoded words is dropped). Any other value is
/// returned unchanged.
///
/// # Errors
///
/// Returns an error if an encoded word is malformed.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let all_encoded = !words.is_empty()
        && words
            .iter()
            .all(|w| w.starts_with("=?") && w.ends_with("?=") && w.len() > 4);

    if !all_encoded {
        return Ok(text.to_string());
    }

    words.iter().map(|w| decode_word(w)).collect()
}
