//! Outbound plain-text email.

use sendgmail_mime::Message;
use sendgmail_mime::encoding::encode_base64_urlsafe;

use crate::error::Result;

/// A plain-text email ready for the Gmail API.
///
/// `encoded` is the URL-safe base64 form of the serialized MIME entity, as
/// expected in the `raw` field of `users.messages.send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    to: String,
    subject: String,
    body: String,
    encoded: String,
}

impl OutboundMessage {
    /// Builds a message. The recipient is not validated.
    ///
    /// # Errors
    ///
    /// Returns an error if `to` or `subject` contains a line break.
    pub fn build(to: &str, subject: &str, body: &str) -> Result<Self> {
        let entity = Message::text_plain(body)
            .with_header("to", to)?
            .with_header("subject", subject)?;

        Ok(Self {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            encoded: encode_base64_urlsafe(&entity.to_bytes()),
        })
    }

    /// Recipient address.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Message body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// URL-safe base64 of the MIME entity.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The `raw` payload for the send request. Same as [`Self::encoded`].
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.encoded
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sendgmail_mime::encoding::decode_base64_urlsafe;

    #[test]
    fn test_known_encoding() {
        let message = OutboundMessage::build("a@b.com", "Hi", "body text").unwrap();
        assert_eq!(
            message.encoded(),
            "Q29udGVudC1UeXBlOiB0ZXh0L3BsYWluOyBjaGFyc2V0PSJ1cy1hc2NpaSIKTUlNRS1WZXJzaW9uOiAxLjAK\
             Q29udGVudC1UcmFuc2Zlci1FbmNvZGluZzogN2JpdAp0bzogYUBiLmNvbQpzdWJqZWN0OiBIaQoKYm9keSB0ZXh0"
        );
        assert_eq!(message.raw(), message.encoded());
    }

    #[test]
    fn test_empty_fields_are_encoded() {
        let message = OutboundMessage::build("", "", "").unwrap();
        let decoded = String::from_utf8(decode_base64_urlsafe(message.encoded()).unwrap()).unwrap();
        assert!(decoded.ends_with("to: \nsubject: \n\n"));
    }

    #[test]
    fn test_header_injection_rejected() {
        let err = OutboundMessage::build("a@b.com\r\nBcc: c@d.com", "Hi", "x").unwrap_err();
        assert!(matches!(err, crate::Error::Mime(_)));
        assert!(OutboundMessage::build("a@b.com", "Hi\nthere", "x").is_err());
    }

    #[test]
    fn test_non_ascii_subject_and_body() {
        let message = OutboundMessage::build("a@b.com", "Grüße", "Schöne Grüße\n").unwrap();
        let entity =
            Message::parse(&decode_base64_urlsafe(message.encoded()).unwrap()).unwrap();
        assert_eq!(entity.subject().unwrap().as_deref(), Some("Grüße"));
        assert_eq!(entity.body_text().unwrap(), "Schöne Grüße\n");
        assert_eq!(entity.content_type().unwrap().charset(), Some("utf-8"));
    }

    proptest! {
        #[test]
        fn prop_build_is_deterministic(
            to in "[^\r\n]{0,40}",
            subject in "[^\r\n]{0,80}",
            body in any::<String>(),
        ) {
            let a = OutboundMessage::build(&to, &subject, &body).unwrap();
            let b = OutboundMessage::build(&to, &subject, &body).unwrap();
            prop_assert_eq!(a.encoded(), b.encoded());
        }

        #[test]
        fn prop_encoded_round_trips(
            to in "[^\r\n]{0,40}",
            subject in "[^\r\n]{0,80}",
            body in any::<String>(),
        ) {
            let message = OutboundMessage::build(&to, &subject, &body).unwrap();
            let entity = Message::parse(&decode_base64_urlsafe(message.encoded()).unwrap()).unwrap();
            prop_assert_eq!(entity.to().unwrap(), Some(to));
            prop_assert_eq!(entity.subject().unwrap(), Some(subject));
            prop_assert_eq!(entity.body_text().unwrap(), body);
        }
    }
}
