//! Entry point for decoding value trees into typed structures.
//!
//! A [`Decoder`] carries the diagnostics context (the source line and the
//! byte offset of the value being decoded) and the [`DecodeOptions`]. It is
//! cheap to copy and holds no mutable state, so one decoder may be shared
//! between threads and used for any number of decode calls.

use crate::address::{self, Address};
use crate::body::{self, MessagePart};
use crate::config::DecodeOptions;
use crate::envelope::{self, Envelope};
use crate::error::Location;
use crate::value::reader::DEFAULT_MAX_NESTING;
use crate::value::{Reader, Value};
use crate::{Error, Result};

/// Decoder for `ENVELOPE` and `BODYSTRUCTURE` value trees.
///
/// # Example
///
/// ```
/// use imap_structure::{Decoder, Value};
///
/// let line = b"(\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 120 5)";
/// let part = Decoder::new(line).read_body_structure().unwrap();
/// assert_eq!(part.mime_type(), "text/plain");
/// assert_eq!(part.lines(), Some(5));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    line: &'a [u8],
    offset: usize,
    options: DecodeOptions,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder for values tokenized from `line`.
    #[must_use]
    pub fn new(line: &'a [u8]) -> Self {
        Self {
            line,
            offset: 0,
            options: DecodeOptions::default(),
        }
    }

    /// Sets the offset of the decoded value inside the line.
    #[must_use]
    pub const fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the decode options.
    #[must_use]
    pub const fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the source line.
    #[must_use]
    pub const fn line(&self) -> &'a [u8] {
        self.line
    }

    /// Returns the offset of the decoded value.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the decode options.
    #[must_use]
    pub const fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Returns the current diagnostic location.
    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.line, self.offset)
    }

    /// Decodes an address list (`NIL` or a list of address tuples).
    pub fn address_list(&self, value: &Value) -> Result<Vec<Address>> {
        address::decode_address_list(self, value)
    }

    /// Decodes a single `(name adl mailbox host)` address tuple.
    pub fn address(&self, items: &[Value]) -> Result<Address> {
        address::decode_address(self, items)
    }

    /// Decodes the ten elements of an `ENVELOPE`.
    pub fn envelope(&self, items: &[Value]) -> Result<Envelope> {
        envelope::decode_envelope(self, items)
    }

    /// Decodes the elements of a `BODYSTRUCTURE` (or `BODY`) list.
    pub fn body_structure(&self, items: &[Value]) -> Result<MessagePart> {
        body::decode::decode_body(self, items, 0)
    }

    /// Reads the list starting at the decoder's offset and decodes it as an
    /// envelope.
    ///
    /// Data after the list is ignored, so this can be pointed into the
    /// middle of a `FETCH` response line.
    pub fn read_envelope(&self) -> Result<Envelope> {
        let (decoder, items) = self.read_list()?;
        decoder.envelope(&items)
    }

    /// Reads the list starting at the decoder's offset and decodes it as a
    /// body structure.
    pub fn read_body_structure(&self) -> Result<MessagePart> {
        let (decoder, items) = self.read_list()?;
        decoder.body_structure(&items)
    }

    /// Reads one list at the offset and returns it with a decoder pointing
    /// at its first byte.
    fn read_list(&self) -> Result<(Self, Vec<Value>)> {
        let input = self.line.get(self.offset..).unwrap_or_default();
        // An envelope below the deepest allowed body adds four list levels.
        let max_nesting = DEFAULT_MAX_NESTING.max(self.options.max_depth.saturating_add(4));
        let mut reader = Reader::new(input).with_max_nesting(max_nesting);
        reader.skip_spaces();
        let start = self.offset + reader.position();
        let value = reader.read_value().map_err(|e| match e {
            Error::Parse { position, message } => Error::Parse {
                position: position + self.offset,
                message,
            },
            other => other,
        })?;
        let decoder = self.with_offset(start);
        match value {
            Value::List(items) => Ok((decoder, items)),
            other => Err(decoder.unexpected("parenthesized list", &other)),
        }
    }

    pub(crate) fn unexpected(&self, expected: &'static str, found: &Value) -> Error {
        Error::UnexpectedType {
            expected,
            found: found.kind(),
            at: self.location(),
        }
    }

    pub(crate) fn no_data(&self, message: &str) -> Error {
        Error::NoData {
            message: message.to_string(),
            at: self.location(),
        }
    }

    pub(crate) fn field_count(&self, what: &'static str, expected: usize, actual: usize) -> Error {
        Error::FieldCount {
            what,
            expected,
            actual,
            at: self.location(),
        }
    }

    /// Requires a string; `NIL` is rejected.
    pub(crate) fn string<'v>(&self, expected: &'static str, value: &'v Value) -> Result<&'v [u8]> {
        value
            .as_bytes()
            .ok_or_else(|| self.unexpected(expected, value))
    }

    /// Requires a string or `NIL`, mapping `NIL` to empty bytes.
    pub(crate) fn nstring(&self, expected: &'static str, value: &Value) -> Result<Vec<u8>> {
        value
            .as_nstring()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| self.unexpected(expected, value))
    }

    pub(crate) fn number(&self, expected: &'static str, value: &Value) -> Result<u32> {
        value
            .as_number()
            .ok_or_else(|| self.unexpected(expected, value))
    }

    pub(crate) fn list<'v>(&self, expected: &'static str, value: &'v Value) -> Result<&'v [Value]> {
        value
            .as_list()
            .ok_or_else(|| self.unexpected(expected, value))
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
    use crate::ErrorKind;

    #[test]
    fn test_read_inside_fetch_line() {
        let line = b"* 12 FETCH (BODYSTRUCTURE (\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 3 1) UID 4)";
        let offset = line
            .windows(14)
            .position(|w| w == b"BODYSTRUCTURE ")
            .unwrap()
            + 14;

        let part = Decoder::new(line)
            .with_offset(offset)
            .read_body_structure()
            .unwrap();
        assert_eq!(part.mime_type(), "text/plain");
        assert_eq!(part.octets(), Some(3));
    }

    #[test]
    fn test_read_reports_absolute_position() {
        let line = b"* 1 FETCH (ENVELOPE (\"date\" \"subject\"";
        let err = Decoder::new(line).with_offset(20).read_envelope().unwrap_err();
        match err {
            Error::Parse { position, .. } => assert_eq!(position, line.len()),
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_requires_list() {
        let err = Decoder::new(b"  NIL").read_body_structure().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let mut line = b"* 1 FETCH (BODYSTRUCTURE ".to_vec();
        line.extend(std::iter::repeat_n(b'(', 100_000));
        let err = Decoder::new(&line)
            .with_offset(25)
            .read_body_structure()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_nesting_follows_max_depth() {
        let levels = 270;
        let mut line = Vec::new();
        for _ in 0..levels {
            line.push(b'(');
        }
        line.extend_from_slice(b"\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1)");
        for _ in 1..levels {
            line.extend_from_slice(b" \"mixed\" NIL)");
        }

        let err = Decoder::new(&line).read_body_structure().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let options = DecodeOptions::builder().max_depth(levels).build();
        let part = Decoder::new(&line)
            .with_options(options)
            .read_body_structure()
            .unwrap();
        assert!(part.is_multipart());
    }

    #[test]
    fn test_location_carries_line() {
        let decoder = Decoder::new(b"abc").with_offset(1);
        let at = decoder.location();
        assert_eq!(at.line, b"abc");
        assert_eq!(at.offset, 1);
    }
}
