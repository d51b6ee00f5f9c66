//! Recursive `BODYSTRUCTURE` decoding.
//!
//! The element list is dispatched on its first element: a string starts a
//! single-part body (`body-type-1part`), a list starts a multipart body
//! (`body-type-mpart`). Nested lists recurse, so the resulting
//! [`MessagePart`] tree mirrors the input one level per list.

use crate::decoder::Decoder;
use crate::envelope::{Envelope, decode_envelope};
use crate::value::Value;
use crate::{Error, Result};

use super::fields::{Fields, decode_extensions, decode_parameters};
use super::{BodyFields, MessagePart, Parameters};

/// Minimum number of elements in any body list.
const MIN_BODY_FIELDS: usize = 3;

/// Elements up to and including `body-fld-octets`.
const BASIC_FIELDS: usize = 7;

/// Elements up to and including the line count of a `message/rfc822` part.
const MESSAGE_FIELDS: usize = 10;

/// Decodes one body list at the given nesting depth.
pub(crate) fn decode_body(
    decoder: &Decoder<'_>,
    items: &[Value],
    depth: usize,
) -> Result<MessagePart> {
    let limit = decoder.options().max_depth;
    if depth > limit {
        return Err(Error::DepthExceeded {
            limit,
            at: decoder.location(),
        });
    }

    if items.len() < MIN_BODY_FIELDS {
        return Err(decoder.no_data("body structure has fewer than three fields"));
    }

    match &items[0] {
        Value::String(_) => {
            tracing::trace!(depth, len = items.len(), "Decoding single-part body");
            decode_single_part(decoder, items, depth)
        }
        Value::List(_) => {
            tracing::trace!(depth, len = items.len(), "Decoding multipart body");
            decode_multipart(decoder, items, depth)
        }
        other => Err(decoder.unexpected("body type or nested body", other)),
    }
}

fn lowercase(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_lowercase()
}

fn decode_single_part(
    decoder: &Decoder<'_>,
    items: &[Value],
    depth: usize,
) -> Result<MessagePart> {
    if items.len() < BASIC_FIELDS {
        return Err(decoder.no_data("single-part body is missing basic fields"));
    }

    let mut cursor = Fields::new(items);
    let mut next = |what: &str| {
        cursor
            .next_field()
            .ok_or_else(|| decoder.no_data(&format!("{what} not found")))
    };

    let media_type = lowercase(decoder.string("media type", next("media type")?)?);
    let media_subtype = lowercase(&decoder.nstring("media subtype", next("media subtype")?)?);
    let parameters = decode_parameters(decoder, next("body-fld-param")?)?;
    let id = decoder.nstring("body-fld-id", next("body-fld-id")?)?;
    let description = decoder.nstring("body-fld-desc", next("body-fld-desc")?)?;
    let encoding = decoder.nstring("body-fld-enc", next("body-fld-enc")?)?;
    let octets = decoder.number("body-fld-octets", next("body-fld-octets")?)?;

    let kind = if media_type == "message" && media_subtype == "rfc822" {
        if items.len() < MESSAGE_FIELDS {
            return Err(decoder.no_data("message/rfc822 body is missing fields"));
        }
        let envelope = decode_envelope(decoder, decoder.list("envelope", next("envelope")?)?)?;
        let body = decode_body(decoder, decoder.list("body", next("body")?)?, depth + 1)?;
        let lines = decoder.number("body-fld-lines", next("body-fld-lines")?)?;
        PartKind::Message {
            envelope: Box::new(envelope),
            body: Box::new(body),
            lines,
        }
    } else if media_type == "text" {
        let lines = decoder.number("body-fld-lines", next("body-fld-lines")?)?;
        PartKind::Text { lines }
    } else {
        PartKind::Basic
    };

    let md5 = match cursor.next_field() {
        Some(value) => decoder.nstring("body-fld-md5", value)?,
        None => Vec::new(),
    };
    let extensions = decode_extensions(decoder, &mut cursor)?;

    let fields = BodyFields {
        media_type,
        media_subtype,
        parameters,
        id,
        description,
        encoding,
        octets,
        md5,
        extensions,
    };

    Ok(match kind {
        PartKind::Basic => MessagePart::Basic { fields },
        PartKind::Text { lines } => MessagePart::Text { fields, lines },
        PartKind::Message {
            envelope,
            body,
            lines,
        } => MessagePart::Message {
            fields,
            envelope,
            body,
            lines,
        },
    })
}

/// Type-specific data read between `body-fld-octets` and the extension
/// fields.
enum PartKind {
    Basic,
    Text {
        lines: u32,
    },
    Message {
        envelope: Box<Envelope>,
        body: Box<MessagePart>,
        lines: u32,
    },
}

fn decode_multipart(decoder: &Decoder<'_>, items: &[Value], depth: usize) -> Result<MessagePart> {
    let mut children = Vec::new();
    let mut cursor = Fields::new(items);

    let subtype = loop {
        match cursor.next_field() {
            Some(Value::List(child)) => children.push(decode_body(decoder, child, depth + 1)?),
            Some(other) => break decoder.string("multipart subtype", other)?,
            None => return Err(decoder.no_data("multipart subtype not found")),
        }
    };

    let parameters = match cursor.next_field() {
        Some(value) => decode_parameters(decoder, value)?,
        None => Parameters::new(),
    };
    let extensions = decode_extensions(decoder, &mut cursor)?;

    Ok(MessagePart::Multipart {
        children,
        media_subtype: lowercase(subtype),
        parameters,
        extensions,
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
    use crate::body::Extension;
    use crate::config::DecodeOptions;
    use crate::value::parse_value;

    fn items(input: &[u8]) -> Vec<Value> {
        match parse_value(input).unwrap() {
            Value::List(items) => items,
            other => panic!("Expected list, got {other:?}"),
        }
    }

    fn decode(input: &[u8]) -> Result<MessagePart> {
        Decoder::new(input).body_structure(&items(input))
    }

    const TEXT_PLAIN: &[u8] = b"(\"text\" \"plain\" () NIL NIL \"7bit\" 120 5)";

    #[test]
    fn test_text_part() {
        let part = decode(TEXT_PLAIN).unwrap();

        let MessagePart::Text { fields, lines } = &part else {
            panic!("Expected text part, got {part:?}");
        };
        assert_eq!(*lines, 5);
        assert_eq!(fields.media_type, "text");
        assert_eq!(fields.media_subtype, "plain");
        assert_eq!(fields.octets, 120);
        assert_eq!(fields.encoding, b"7bit");
        assert!(fields.parameters.is_empty());
        assert!(fields.id.is_empty());
        assert!(fields.md5.is_empty());
        assert_eq!(fields.extensions, crate::body::Extensions::default());
    }

    #[test]
    fn test_type_is_lowercased() {
        let part =
            decode(b"(\"TEXT\" \"HTML\" (\"CHARSET\" \"UTF-8\") NIL NIL \"QUOTED-PRINTABLE\" 10 1)")
                .unwrap();
        assert_eq!(part.mime_type(), "text/html");
        assert_eq!(part.parameter("charset"), Some(&b"UTF-8"[..]));
        // Encoding is kept as sent.
        assert_eq!(part.fields().unwrap().encoding, b"QUOTED-PRINTABLE");
    }

    #[test]
    fn test_basic_part_with_tail() {
        let part = decode(
            b"(\"APPLICATION\" \"PDF\" (\"NAME\" \"a.pdf\") \"<id@x>\" \"Report\" \"BASE64\" 4096 \
              \"md5sum\" (\"ATTACHMENT\" (\"FILENAME\" \"a.pdf\")) (\"en\" \"de\") \"http://x/a\")",
        )
        .unwrap();

        let MessagePart::Basic { fields } = &part else {
            panic!("Expected basic part, got {part:?}");
        };
        assert_eq!(fields.id, b"<id@x>");
        assert_eq!(fields.description, b"Report");
        assert_eq!(fields.md5, b"md5sum");
        assert!(part.disposition().unwrap().is_attachment());
        assert_eq!(part.languages(), [b"en".to_vec(), b"de".to_vec()]);
        assert_eq!(part.location(), b"http://x/a");
        assert!(part.extension().is_none());
        assert_eq!(part.lines(), None);
    }

    #[test]
    fn test_single_part_extension_data() {
        let part = decode(b"(\"image\" \"png\" NIL NIL NIL \"base64\" 10 NIL NIL NIL NIL 42)")
            .unwrap();
        assert_eq!(part.extension(), Some(&Extension::Single(Value::Number(42))));

        let part = decode(
            b"(\"image\" \"png\" NIL NIL NIL \"base64\" 10 NIL NIL NIL NIL 42 (\"x\") NIL)",
        )
        .unwrap();
        assert_eq!(
            part.extension(),
            Some(&Extension::Multiple(vec![
                Value::Number(42),
                Value::list([Value::from("x")]),
                Value::Nil,
            ]))
        );
    }

    #[test]
    fn test_embedded_message_is_compositional() {
        let envelope = b"(NIL \"Inner\" NIL NIL NIL NIL NIL NIL NIL \"<inner@x>\")".as_slice();
        let nested = TEXT_PLAIN;
        let mut embed = b"(\"MESSAGE\" \"RFC822\" NIL NIL NIL \"7BIT\" 300 ".to_vec();
        embed.extend_from_slice(envelope);
        embed.push(b' ');
        embed.extend_from_slice(nested);
        embed.extend_from_slice(b" 12)");

        let part = decode(&embed).unwrap();
        let decoder = Decoder::new(b"");

        assert_eq!(part.mime_type(), "message/rfc822");
        assert_eq!(part.lines(), Some(12));
        assert_eq!(part.embedded_body().unwrap(), &decode(nested).unwrap());
        assert_eq!(
            part.envelope().unwrap(),
            &decoder.envelope(&items(envelope)).unwrap()
        );
    }

    #[test]
    fn test_embedded_message_missing_fields() {
        let err = decode(b"(\"message\" \"rfc822\" NIL NIL NIL \"7bit\" 300 NIL NIL)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoData);

        let err = decode(b"(\"message\" \"rfc822\" NIL NIL NIL \"7bit\" 300 NIL NIL 3)")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
    }

    #[test]
    fn test_other_message_subtype_is_basic() {
        let part =
            decode(b"(\"message\" \"delivery-status\" NIL NIL NIL \"7bit\" 300)").unwrap();
        assert!(matches!(part, MessagePart::Basic { .. }));
    }

    #[test]
    fn test_multipart_subtype_case_is_normalised() {
        let child = "(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1)";
        for subtype in ["MiXeD", "MIXED", "mixed"] {
            let input = format!("({child}{child} \"{subtype}\")");
            let part = decode(input.as_bytes()).unwrap();
            assert_eq!(part.media_subtype(), "mixed");
            assert_eq!(part.mime_type(), "multipart/mixed");
        }
    }

    #[test]
    fn test_nil_optional_fields() {
        let part = decode(
            b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1 NIL NIL NIL NIL)",
        )
        .unwrap();
        assert!(part.parameters().is_empty());
        assert!(part.disposition().is_none());
        assert!(part.languages().is_empty());
        assert!(part.location().is_empty());
        assert!(part.fields().unwrap().md5.is_empty());

        let child = "(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1)";
        let input = format!("({child}{child} \"mixed\" NIL NIL NIL NIL)");
        let part = decode(input.as_bytes()).unwrap();
        assert!(part.parameters().is_empty());
        assert!(part.disposition().is_none());
        assert!(part.languages().is_empty());
    }

    #[test]
    fn test_multipart() {
        let part = decode(
            b"((\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1)(\"text\" \"html\" NIL NIL NIL \"7bit\" 2 1) \"MIXED\")",
        )
        .unwrap();

        assert!(part.is_multipart());
        assert_eq!(part.media_subtype(), "mixed");
        assert_eq!(part.children().len(), 2);
        assert_eq!(part.children()[1].mime_type(), "text/html");
        assert!(part.parameters().is_empty());
        assert_eq!(part.extensions(), &crate::body::Extensions::default());
    }

    #[test]
    fn test_multipart_tail() {
        let child = "(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1)";

        let one = format!("({child}{child} \"mixed\" (\"BOUNDARY\" \"xyz\") NIL NIL NIL \"ext\")");
        let part = decode(one.as_bytes()).unwrap();
        assert_eq!(part.parameter("boundary"), Some(&b"xyz"[..]));
        assert_eq!(part.extension(), Some(&Extension::Single(Value::from("ext"))));

        let two = format!("({child}{child} \"mixed\" NIL NIL NIL NIL \"a\" 7)");
        let part = decode(two.as_bytes()).unwrap();
        assert_eq!(
            part.extension(),
            Some(&Extension::Multiple(vec![Value::from("a"), Value::Number(7)]))
        );
    }

    #[test]
    fn test_multipart_subtype_errors() {
        let child = "(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1)";

        let missing = format!("({child}{child}{child})");
        assert_eq!(
            decode(missing.as_bytes()).unwrap_err().kind(),
            ErrorKind::NoData
        );

        let number = format!("({child}{child} 5)");
        assert_eq!(
            decode(number.as_bytes()).unwrap_err().kind(),
            ErrorKind::UnexpectedType
        );
    }

    #[test]
    fn test_too_few_fields() {
        for input in [&b"()"[..], b"(\"text\")", b"(\"text\" \"plain\")"] {
            assert_eq!(decode(input).unwrap_err().kind(), ErrorKind::NoData);
        }
        let err = decode(b"(\"text\" \"plain\" NIL NIL NIL \"7bit\")").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoData);

        // Text without a line count.
        let err = decode(b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" 10)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoData);
    }

    #[test]
    fn test_wrong_field_types() {
        for input in [
            &b"(NIL \"plain\" NIL NIL NIL \"7bit\" 1 1)"[..],
            b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" \"1\" 1)",
            b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 \"1\")",
            b"(\"text\" \"plain\" NIL (\"x\") NIL \"7bit\" 1 1)",
            b"(\"text\" \"plain\" \"charset\" NIL NIL \"7bit\" 1 1)",
            b"(\"text\" \"plain\" (\"charset\") NIL NIL \"7bit\" 1 1)",
            b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1 ())",
            b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1 NIL 5)",
            b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1 NIL NIL 5)",
            b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1 NIL NIL NIL 5)",
        ] {
            let err = decode(input).unwrap_err();
            assert_eq!(
                err.kind(),
                ErrorKind::UnexpectedType,
                "{}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_malformed_disposition_is_fatal() {
        let err = decode(b"(\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1 NIL (\"inline\"))")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldCount);
    }

    #[test]
    fn test_depth_limit() {
        let mut input = Vec::new();
        let levels = 5;
        for _ in 0..levels {
            input.push(b'(');
        }
        input.extend_from_slice(b"\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1)");
        for _ in 1..levels {
            input.extend_from_slice(b" \"mixed\" NIL)");
        }

        let list = items(&input);

        let options = DecodeOptions::builder().max_depth(3).build();
        let err = Decoder::new(&input)
            .with_options(options)
            .body_structure(&list)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);

        let options = DecodeOptions::builder().max_depth(4).build();
        let part = Decoder::new(&input)
            .with_options(options)
            .body_structure(&list)
            .unwrap();
        assert_eq!(part.find_section("1.1.1.1").unwrap().mime_type(), "text/plain");
    }

    #[test]
    fn test_error_carries_location() {
        let decoder = Decoder::new(b"* 1 FETCH (BODYSTRUCTURE ...)").with_offset(25);
        let err = decoder.body_structure(&[Value::Number(1)]).unwrap_err();
        let at = err.location().unwrap();
        assert_eq!(at.offset, 25);
        assert_eq!(at.line, b"* 1 FETCH (BODYSTRUCTURE ...)");
    }

    #[test]
    fn test_non_string_non_list_head() {
        let list = [Value::Number(1), Value::Nil, Value::Nil];
        let err = Decoder::new(b"").body_structure(&list).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
    }
}
