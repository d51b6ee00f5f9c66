//! Message envelope.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::Result;
use crate::address::{Address, decode_address_list};
use crate::decoder::Decoder;
use crate::value::Value;

/// Number of fields in an `ENVELOPE` list.
pub const ENVELOPE_FIELDS: usize = 10;

/// Message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header; `None` when missing or unparsable.
    pub date: Option<DateTime<FixedOffset>>,
    /// Subject header, undecoded.
    pub subject: Vec<u8>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Vec<u8>,
    /// Message-ID header.
    pub message_id: Vec<u8>,
}

impl Envelope {
    /// Returns the subject as text, replacing invalid UTF-8.
    #[must_use]
    pub fn subject_lossy(&self) -> String {
        String::from_utf8_lossy(&self.subject).into_owned()
    }

    /// Returns the Message-ID as text, replacing invalid UTF-8.
    #[must_use]
    pub fn message_id_lossy(&self) -> String {
        String::from_utf8_lossy(&self.message_id).into_owned()
    }
}

fn write_addresses(f: &mut fmt::Formatter<'_>, addresses: &[Address]) -> fmt::Result {
    f.write_str("[ ")?;
    for address in addresses {
        write!(f, "{address}, ")?;
    }
    f.write_str(" ]")
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.date {
            Some(date) => writeln!(f, "Date: {}", date.to_rfc2822())?,
            None => writeln!(f, "Date: ")?,
        }
        writeln!(f, "Subject: {}", String::from_utf8_lossy(&self.subject))?;
        for (header, addresses) in [
            ("From", &self.from),
            ("Sender", &self.sender),
            ("Reply-To", &self.reply_to),
            ("To", &self.to),
            ("Cc", &self.cc),
            ("Bcc", &self.bcc),
        ] {
            write!(f, "{header}: ")?;
            write_addresses(f, addresses)?;
            writeln!(f)?;
        }
        writeln!(
            f,
            "In-Reply-To: {}",
            String::from_utf8_lossy(&self.in_reply_to)
        )?;
        writeln!(f, "Message-Id: {}", String::from_utf8_lossy(&self.message_id))
    }
}

/// Decodes the ten elements of an envelope.
pub(crate) fn decode_envelope(decoder: &Decoder<'_>, items: &[Value]) -> Result<Envelope> {
    let [
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    ] = items
    else {
        return Err(decoder.field_count("envelope", ENVELOPE_FIELDS, items.len()));
    };

    // Anything that is not a parsable string leaves the date unset.
    let date = match date {
        Value::String(raw) => {
            let parsed = (decoder.options().date_parser)(raw);
            if parsed.is_none() {
                tracing::debug!(
                    date = %String::from_utf8_lossy(raw),
                    "Unparsable envelope date"
                );
            }
            parsed
        }
        _ => None,
    };

    Ok(Envelope {
        date,
        subject: subject.to_bytes_lossy(),
        from: decode_address_list(decoder, from)?,
        sender: decode_address_list(decoder, sender)?,
        reply_to: decode_address_list(decoder, reply_to)?,
        to: decode_address_list(decoder, to)?,
        cc: decode_address_list(decoder, cc)?,
        bcc: decode_address_list(decoder, bcc)?,
        in_reply_to: decoder.nstring("env-in-reply-to", in_reply_to)?,
        message_id: decoder.nstring("env-message-id", message_id)?,
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::config::DecodeOptions;
    use crate::value::parse_value;
    use proptest::prelude::*;

    const RFC3501_ENVELOPE: &[u8] = b"(\"Wed, 17 Jul 1996 02:23:25 -0700 (PDT)\" \
        \"IMAP4rev1 WG mtg summary and minutes\" \
        ((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) \
        ((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) \
        ((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) \
        ((NIL NIL \"imap\" \"cac.washington.edu\")) \
        ((NIL NIL \"minutes\" \"CNRI.Reston.VA.US\") \
        (\"John Klensin\" NIL \"KLENSIN\" \"MIT.EDU\")) NIL NIL \
        \"<B27397-0100000@cac.washington.edu>\")";

    fn items(input: &[u8]) -> Vec<Value> {
        match parse_value(input).unwrap() {
            Value::List(items) => items,
            other => panic!("Expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_rfc3501_example() {
        let envelope = Decoder::new(b"").envelope(&items(RFC3501_ENVELOPE)).unwrap();

        assert_eq!(
            envelope.date.unwrap().to_rfc3339(),
            "1996-07-17T02:23:25-07:00"
        );
        assert_eq!(envelope.subject, b"IMAP4rev1 WG mtg summary and minutes");
        assert_eq!(envelope.from.len(), 1);
        assert_eq!(envelope.from[0].name, b"Terry Gray");
        assert_eq!(envelope.to[0].mailbox, b"imap");
        assert_eq!(envelope.cc.len(), 2);
        assert_eq!(envelope.cc[0].mailbox, b"minutes");
        assert_eq!(envelope.cc[1].mailbox, b"KLENSIN");
        assert!(envelope.bcc.is_empty());
        assert!(envelope.in_reply_to.is_empty());
        assert_eq!(envelope.message_id, b"<B27397-0100000@cac.washington.edu>");
    }

    #[test]
    fn test_wrong_field_count() {
        let decoder = Decoder::new(b"");
        for len in [0, 1, 9, 11] {
            let items = vec![Value::Nil; len];
            let err = decoder.envelope(&items).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::FieldCount, "length {len}");
        }
    }

    #[test]
    fn test_all_nil() {
        let envelope = Decoder::new(b"").envelope(&vec![Value::Nil; 10]).unwrap();
        assert_eq!(envelope, Envelope::default());
    }

    #[test]
    fn test_bad_date_is_not_an_error() {
        let decoder = Decoder::new(b"");
        let mut fields = vec![Value::Nil; 10];

        fields[0] = Value::from("yesterday-ish");
        assert!(decoder.envelope(&fields).unwrap().date.is_none());

        fields[0] = Value::Number(12);
        assert!(decoder.envelope(&fields).unwrap().date.is_none());

        fields[0] = Value::List(Vec::new());
        assert!(decoder.envelope(&fields).unwrap().date.is_none());
    }

    #[test]
    fn test_custom_date_parser() {
        fn epoch(_: &[u8]) -> Option<DateTime<FixedOffset>> {
            DateTime::parse_from_rfc3339("1970-01-01T00:00:00+00:00").ok()
        }

        let options = DecodeOptions::builder().date_parser(epoch).build();
        let mut fields = vec![Value::Nil; 10];
        fields[0] = Value::from("whatever");

        let envelope = Decoder::new(b"")
            .with_options(options)
            .envelope(&fields)
            .unwrap();
        assert_eq!(envelope.date.unwrap().timestamp(), 0);
    }

    #[test]
    fn test_subject_is_coerced() {
        let decoder = Decoder::new(b"");
        let mut fields = vec![Value::Nil; 10];
        fields[1] = Value::Number(42);
        assert_eq!(decoder.envelope(&fields).unwrap().subject, b"42");

        fields[1] = Value::from("=?utf-8?q?caf=C3=A9?=");
        assert_eq!(
            decoder.envelope(&fields).unwrap().subject,
            b"=?utf-8?q?caf=C3=A9?="
        );
    }

    #[test]
    fn test_message_id_must_be_string() {
        let decoder = Decoder::new(b"");
        let mut fields = vec![Value::Nil; 10];
        fields[9] = Value::Number(1);
        assert_eq!(
            decoder.envelope(&fields).unwrap_err().kind(),
            ErrorKind::UnexpectedType
        );

        let mut fields = vec![Value::Nil; 10];
        fields[8] = Value::List(Vec::new());
        assert_eq!(
            decoder.envelope(&fields).unwrap_err().kind(),
            ErrorKind::UnexpectedType
        );
    }

    #[test]
    fn test_address_error_propagates() {
        let decoder = Decoder::new(b"").with_offset(7);
        let mut fields = vec![Value::Nil; 10];
        fields[6] = Value::list([Value::list([Value::Nil, Value::Nil])]);

        let err = decoder.envelope(&fields).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldCount);
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn test_display() {
        let envelope = Envelope {
            subject: b"Hello".to_vec(),
            from: vec![Address::new("A", "a", "example.org")],
            ..Envelope::default()
        };
        let text = envelope.to_string();
        assert!(text.contains("Subject: Hello\n"));
        assert!(text.contains("From: [ \"A\" <a@example.org>,  ]\n"));
    }

    proptest! {
        #[test]
        fn prop_wrong_arity_always_fails(len in 0usize..32) {
            prop_assume!(len != ENVELOPE_FIELDS);
            let items = vec![Value::Nil; len];
            let err = Decoder::new(b"").envelope(&items).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::FieldCount);
        }
    }
}
