//! # imap-structure
//!
//! Typed decoding of the IMAP `ENVELOPE` and `BODYSTRUCTURE` fetch attributes
//! (RFC 3501, section 7.4.2).
//!
//! ## Features
//!
//! - **Value tree input**: Decoders work on a generic [`Value`] tree, so any
//!   tokenizer can feed them; a small wire reader is included
//! - **Complete body model**: Basic, text, embedded `message/rfc822` and
//!   multipart parts with every optional extension field
//! - **Lenient dates**: Unparsable envelope dates are kept as `None` instead
//!   of failing the whole envelope
//! - **Section addressing**: Resolve IMAP part numbers such as `3.1` against
//!   a decoded structure
//! - **Bounded recursion**: Deeply nested bodies fail cleanly with
//!   [`Error::DepthExceeded`]
//!
//! ## Quick Start
//!
//! ```
//! use imap_structure::{Decoder, MessagePart};
//!
//! let line = br#"* 3 FETCH (BODYSTRUCTURE (("TEXT" "PLAIN" ("CHARSET" "UTF-8") NIL NIL "7BIT" 12 1)("IMAGE" "PNG" ("NAME" "a.png") NIL NIL "BASE64" 2048) "MIXED"))"#;
//! let offset = 25;
//!
//! let body = Decoder::new(line).with_offset(offset).read_body_structure()?;
//! assert_eq!(body.mime_type(), "multipart/mixed");
//!
//! let image = body.find_section("2").unwrap();
//! assert_eq!(image.parameter("name"), Some(&b"a.png"[..]));
//! assert!(matches!(image, MessagePart::Basic { .. }));
//! # Ok::<(), imap_structure::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`value`]: Generic value tree and wire reader
//! - [`decoder`]: Decoder entry point
//! - [`address`], [`envelope`], [`body`]: Decoded types
//! - [`config`]: Decode options
//! - [`datetime`]: Default envelope date parser

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod body;
pub mod config;
pub mod datetime;
pub mod decoder;
pub mod envelope;
mod error;
pub mod value;

pub use address::Address;
pub use body::{
    BodyFields, Disposition, Extension, Extensions, MessagePart, Parameters, section_name,
};
pub use config::{DecodeOptions, DecodeOptionsBuilder};
pub use decoder::Decoder;
pub use envelope::Envelope;
pub use error::{Error, ErrorKind, Location, Result};
pub use value::{Value, ValueKind, parse_value};

/// Reads and decodes a parenthesized `BODYSTRUCTURE` list.
///
/// `input` must hold exactly one list, optionally surrounded by spaces.
pub fn parse_body_structure(input: &[u8]) -> Result<MessagePart> {
    match parse_value(input)? {
        Value::List(items) => Decoder::new(input).body_structure(&items),
        other => Err(Decoder::new(input).unexpected("parenthesized list", &other)),
    }
}

/// Reads and decodes a parenthesized `ENVELOPE` list.
///
/// `input` must hold exactly one list, optionally surrounded by spaces.
pub fn parse_envelope(input: &[u8]) -> Result<Envelope> {
    match parse_value(input)? {
        Value::List(items) => Decoder::new(input).envelope(&items),
        other => Err(Decoder::new(input).unexpected("parenthesized list", &other)),
    }
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

    #[test]
    fn test_parse_body_structure() {
        let body = parse_body_structure(b"(\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 3 1)").unwrap();
        assert_eq!(body.mime_type(), "text/plain");
    }

    #[test]
    fn test_parse_requires_list() {
        let err = parse_body_structure(b"NIL").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);

        let err = parse_envelope(b"\"x\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
    }

    #[test]
    fn test_parse_rejects_trailing_data() {
        let err = parse_envelope(b"(NIL NIL NIL NIL NIL NIL NIL NIL NIL NIL) x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
