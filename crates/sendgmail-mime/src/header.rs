//! MIME header handling.
//!
//! Headers keep their insertion order and the exact spelling of their
//! names, so serialization is deterministic. Lookups are case-insensitive.

use crate::encoding::{decode_rfc2047, encode_rfc2047};
use crate::error::{Error, Result};
use std::fmt;

/// Line length at which serialized header lines are folded.
const MAX_LINE_LEN: usize = 78;

/// Ordered collection of email headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is empty or not a valid
    /// field name, or if the value contains a line break.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate(&name, &value)?;
        self.entries.push((name, value));
        Ok(())
    }

    /// Appends a header the crate builds itself from constant names and
    /// single-line values.
    pub(crate) fn push(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        debug_assert!(validate(name, &value).is_ok(), "invalid built-in header {name}");
        self.entries.push((name.to_string(), value));
    }

    /// Gets the first raw value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets the first value for a header with RFC 2047 words decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the value contains malformed encoded words.
    pub fn get_decoded(&self, name: &str) -> Result<Option<String>> {
        self.get(name).map(decode_rfc2047).transpose()
    }

    /// Returns an iterator over all headers in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a header block.
    ///
    /// Lines may end in `\n` or `\r\n`. Continuation lines (starting with a
    /// space or tab) are unfolded. Parsing stops at the first empty line.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a header nor a continuation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                let (_, value) = headers.entries.last_mut().ok_or_else(|| {
                    Error::Parse(format!("continuation line without header: {line:?}"))
                })?;
                value.push_str(line);
                continue;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::Parse(format!("malformed header line: {line:?}")))?;
            let value = value.strip_prefix(' ').unwrap_or(value);
            headers.entries.push((name.trim_end().to_string(), value.to_string()));
        }

        Ok(headers)
    }

    /// Encodes a header value using RFC 2047 if needed.
    #[must_use]
    pub fn encode_value(value: &str) -> String {
        encode_rfc2047(value, "utf-8")
    }
}

fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
        return Err(Error::InvalidHeader(format!("bad header name {name:?}")));
    }
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidHeader(format!(
            "{name} must be a single line"
        )));
    }
    Ok(())
}

/// Writes one header line, folding it before a space or tab so that lines
/// stay within [`MAX_LINE_LEN`] where the value allows it.
///
/// Only whitespace is a fold point, so a run longer than the limit stays on
/// one line. Unfolding (dropping the inserted line breaks) restores the line.
fn write_folded(f: &mut fmt::Formatter<'_>, line: &str, mut floor: usize) -> fmt::Result {
    let is_wsp = |b: u8| b == b' ' || b == b'\t';
    let mut rest = line;

    while rest.len() > MAX_LINE_LEN {
        let bytes = rest.as_bytes();
        // A fold must leave visible text on both sides.
        let Some(end) = bytes.iter().rposition(|&b| !is_wsp(b)) else {
            break;
        };
        let within = (floor + 1..=MAX_LINE_LEN.min(end))
            .rev()
            .find(|&i| is_wsp(bytes[i]));
        let beyond = || (MAX_LINE_LEN.max(floor) + 1..end).find(|&i| is_wsp(bytes[i]));
        let Some(at) = within.or_else(beyond) else {
            break;
        };

        writeln!(f, "{}", &rest[..at])?;
        rest = &rest[at..];
        match rest.bytes().position(|b| !is_wsp(b)) {
            Some(first) => floor = first,
            None => break,
        }
    }

    writeln!(f, "{rest}")
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            // Folding right after "name:" would change the value on unfolding.
            write_folded(f, &format!("{name}: {value}"), name.len() + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain").unwrap();
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_headers_keep_order_and_case() {
        let mut headers = Headers::new();
        headers.add("MIME-Version", "1.0").unwrap();
        headers.add("to", "a@b.com").unwrap();
        headers.add("subject", "Hi").unwrap();
        assert_eq!(headers.to_string(), "MIME-Version: 1.0\nto: a@b.com\nsubject: Hi\n");
    }

    #[test]
    fn test_long_value_is_folded_at_whitespace() {
        let subject = vec!["quarterly"; 120].join(" ");
        let mut headers = Headers::new();
        headers.add("subject", subject.as_str()).unwrap();

        let text = headers.to_string();
        assert!(text.lines().count() > 1);
        assert!(text.lines().all(|line| line.len() <= MAX_LINE_LEN));
        assert!(text.lines().skip(1).all(|line| line.starts_with(' ')));

        let parsed = Headers::parse(&text).unwrap();
        assert_eq!(parsed.get("subject"), Some(subject.as_str()));
    }

    #[test]
    fn test_unbreakable_value_stays_on_one_line() {
        let token = "x".repeat(200);
        let mut headers = Headers::new();
        headers.add("to", token.as_str()).unwrap();
        assert_eq!(headers.to_string(), format!("to: {token}\n"));
    }

    #[test]
    fn test_fold_keeps_inner_whitespace_runs() {
        let value = format!("{}   {}\t{}", "a".repeat(70), "b".repeat(70), "c".repeat(10));
        let mut headers = Headers::new();
        headers.add("subject", value.as_str()).unwrap();

        let parsed = Headers::parse(&headers.to_string()).unwrap();
        assert_eq!(parsed.get("subject"), Some(value.as_str()));
    }

    #[test]
    fn test_short_values_are_not_folded() {
        let mut headers = Headers::new();
        headers.add("subject", "Hi there").unwrap();
        assert_eq!(headers.to_string(), "subject: Hi there\n");
    }

    #[test]
    fn test_rejects_line_breaks() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.add("subject", "Hi\r\nBcc: evil@example.com"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(headers.add("bad name", "x").is_err());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "ignored: body\r\n"
        );

        let headers = Headers::parse(text).unwrap();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers.get("from"), Some("sender@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(headers.get("Content-Type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_parse_keeps_inner_whitespace() {
        let headers = Headers::parse("subject: a  b \n").unwrap();
        assert_eq!(headers.get("subject"), Some("a  b "));
    }

    #[test]
    fn test_get_decoded() {
        let mut headers = Headers::new();
        headers.add("subject", Headers::encode_value("Grüße")).unwrap();
        assert_eq!(headers.get_decoded("subject").unwrap().as_deref(), Some("Grüße"));
        assert_eq!(headers.get_decoded("missing").unwrap(), None);
    }
}
