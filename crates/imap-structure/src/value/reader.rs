//! Reader turning IMAP wire syntax into a [`Value`] tree.
//!
//! This is a small tokenizer for the subset of the RFC 3501 grammar that
//! appears inside `BODYSTRUCTURE` and `ENVELOPE` data: `NIL`, numbers, atoms,
//! quoted strings, literals and parenthesized lists.

#![allow(clippy::missing_errors_doc)]

use crate::{Error, Result};

use super::Value;

/// Lexical tokens of the value grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Atom(Vec<u8>),
    QuotedString(Vec<u8>),
    Literal(Vec<u8>),
    Number(u32),
    LParen,
    RParen,
    Space,
    Crlf,
    Nil,
    Eof,
}

/// Default limit on nested parenthesized lists.
pub const DEFAULT_MAX_NESTING: usize = 256;

/// IMAP value reader state.
#[derive(Debug)]
pub struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    nesting: usize,
    max_nesting: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            nesting: 0,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// Sets how many lists may be open at once.
    #[must_use]
    pub const fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns true if at end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Skips optional spaces.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.advance();
        }
    }

    /// Reads one complete value, descending into lists.
    pub fn read_value(&mut self) -> Result<Value> {
        let start = self.pos;
        match self.next_token()? {
            Token::Nil => Ok(Value::Nil),
            Token::Number(n) => Ok(Value::Number(n)),
            Token::Atom(s) | Token::QuotedString(s) | Token::Literal(s) => Ok(Value::String(s)),
            Token::LParen => {
                if self.nesting >= self.max_nesting {
                    return Err(Error::Parse {
                        position: start,
                        message: format!("Lists nested deeper than {}", self.max_nesting),
                    });
                }
                self.nesting += 1;
                let list = self.read_list_tail();
                self.nesting -= 1;
                list
            }
            token => Err(Error::Parse {
                position: start,
                message: format!("Expected value, got {token:?}"),
            }),
        }
    }

    /// Reads list items up to and including the closing parenthesis.
    fn read_list_tail(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(b')') => {
                    self.advance();
                    return Ok(Value::List(items));
                }
                Some(b' ') => {
                    // Some servers put spaces between adjacent lists or
                    // after the opening parenthesis.
                    self.skip_spaces();
                }
                Some(_) => items.push(self.read_value()?),
                None => return Err(self.error("Unexpected EOF in list")),
            }
        }
    }

    /// Reads the next token.
    fn next_token(&mut self) -> Result<Token> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        match byte {
            b'\r' => {
                if self.peek_at(1) == Some(b'\n') {
                    self.skip(2);
                    Ok(Token::Crlf)
                } else {
                    Err(self.error("Expected LF after CR"))
                }
            }
            b' ' => {
                self.advance();
                Ok(Token::Space)
            }
            b'(' => {
                self.advance();
                Ok(Token::LParen)
            }
            b')' => {
                self.advance();
                Ok(Token::RParen)
            }
            b'"' => self.read_quoted_string(),
            b'{' => self.read_literal(),
            b'0'..=b'9' => self.read_number_or_atom(),
            _ if is_atom_char(byte) => self.read_atom(),
            _ => Err(self.error(&format!("Unexpected character: {byte:#04x}"))),
        }
    }

    /// Reads a quoted string token.
    fn read_quoted_string(&mut self) -> Result<Token> {
        self.advance(); // Skip opening quote

        let mut result = Vec::new();

        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => result.push(c),
                    Some(c) => {
                        return Err(self.error(&format!("Invalid escape: \\{}", char::from(c))));
                    }
                    None => return Err(self.error("Unexpected EOF in quoted string")),
                },
                Some(b'\r' | b'\n') => return Err(self.error("Line break in quoted string")),
                Some(c) => result.push(c),
                None => return Err(self.error("Unexpected EOF in quoted string")),
            }
        }

        Ok(Token::QuotedString(result))
    }

    /// Reads a literal `{n}\r\n` followed by `n` bytes.
    fn read_literal(&mut self) -> Result<Token> {
        self.advance(); // Skip {

        let start = self.pos;
        let mut literal_plus = false;

        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => {
                    self.advance();
                }
                b'+' => {
                    literal_plus = true;
                    self.advance();
                }
                b'}' => break,
                _ => return Err(self.error("Invalid character in literal size")),
            }
        }

        let size_str = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid literal size"))?
            .trim_end_matches('+');

        let size: usize = size_str
            .parse()
            .map_err(|_| self.error("Invalid literal size number"))?;

        if self.advance() != Some(b'}') {
            return Err(self.error("Expected } after literal size"));
        }

        if literal_plus {
            if self.peek() == Some(b'\r') && self.peek_at(1) == Some(b'\n') {
                self.skip(2);
            }
        } else if self.advance() != Some(b'\r') || self.advance() != Some(b'\n') {
            return Err(self.error("Expected CRLF after literal size"));
        }

        if size > self.input.len() - self.pos {
            return Err(self.error("Incomplete literal data"));
        }

        let data = self.input[self.pos..self.pos + size].to_vec();
        self.skip(size);

        Ok(Token::Literal(data))
    }

    /// Reads a number or an atom starting with a digit.
    fn read_number_or_atom(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut all_digits = true;

        while let Some(b) = self.peek() {
            if !is_atom_char(b) {
                break;
            }
            all_digits &= b.is_ascii_digit();
            self.advance();
        }

        let raw = &self.input[start..self.pos];
        if !all_digits {
            return Ok(Token::Atom(raw.to_vec()));
        }

        let n = std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| Error::Parse {
                position: start,
                message: "Number too large".to_string(),
            })?;
        Ok(Token::Number(n))
    }

    /// Reads an atom token, recognizing `NIL`.
    fn read_atom(&mut self) -> Result<Token> {
        let start = self.pos;

        while let Some(b) = self.peek() {
            if !is_atom_char(b) {
                break;
            }
            self.advance();
        }

        let raw = &self.input[start..self.pos];
        if raw.eq_ignore_ascii_case(b"NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(raw.to_vec()))
        }
    }

    /// Consumes trailing spaces and an optional CRLF, then requires EOF.
    pub fn finish(&mut self) -> Result<()> {
        self.skip_spaces();
        match self.next_token()? {
            Token::Eof => Ok(()),
            Token::Crlf if self.is_eof() => Ok(()),
            token => Err(self.error(&format!("Trailing data after value: {token:?}"))),
        }
    }

    /// Creates a parse error at the current position.
    fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }
}

/// Parses exactly one value from `input`.
///
/// Trailing spaces and a final CRLF are accepted; anything else after the
/// value is an error.
pub fn parse_value(input: &[u8]) -> Result<Value> {
    let mut reader = Reader::new(input);
    reader.skip_spaces();
    let value = reader.read_value()?;
    reader.finish()?;
    Ok(value)
}

/// Returns true if the byte is a valid atom character.
///
/// `]` and `\` are accepted so that section specifiers and flags read as one
/// atom.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    // atom-specials = "(" / ")" / "{" / SP / CTL / "%" / "*" / DQUOTE
    matches!(b,
        0x21 |
        0x23..=0x24 |
        0x26..=0x27 |
        0x2B..=0x7A |
        0x7C |
        0x7E
    )
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
    fn test_scalars() {
        assert_eq!(parse_value(b"NIL").unwrap(), Value::Nil);
        assert_eq!(parse_value(b"nil").unwrap(), Value::Nil);
        assert_eq!(parse_value(b"123").unwrap(), Value::Number(123));
        assert_eq!(parse_value(b"TEXT").unwrap(), Value::from("TEXT"));
        assert_eq!(parse_value(b"7BIT").unwrap(), Value::from("7BIT"));
        assert_eq!(
            parse_value(b"\"hello world\"").unwrap(),
            Value::from("hello world")
        );
    }

    #[test]
    fn test_quoted_string_escaped() {
        assert_eq!(
            parse_value(b"\"hello \\\"world\\\"\"").unwrap(),
            Value::from("hello \"world\"")
        );
        assert!(parse_value(b"\"bad \\n escape\"").is_err());
    }

    #[test]
    fn test_quoted_string_keeps_raw_bytes() {
        assert_eq!(
            parse_value(b"\"caf\xe9\"").unwrap(),
            Value::String(b"caf\xe9".to_vec())
        );
    }

    #[test]
    fn test_literal() {
        assert_eq!(
            parse_value(b"{5}\r\nhello").unwrap(),
            Value::from("hello")
        );
        assert_eq!(
            parse_value(b"{2+}\r\n()").unwrap(),
            Value::from("()")
        );
        assert!(parse_value(b"{10}\r\nshort").is_err());
    }

    #[test]
    fn test_nested_list() {
        let value = parse_value(b"(\"a\" (1 NIL) ())").unwrap();
        assert_eq!(
            value,
            Value::list([
                Value::from("a"),
                Value::list([Value::Number(1), Value::Nil]),
                Value::List(Vec::new()),
            ])
        );
    }

    #[test]
    fn test_adjacent_lists() {
        let value = parse_value(b"((\"a\")(\"b\") \"mixed\")").unwrap();
        let items = value.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_list());
        assert!(items[1].is_list());
    }

    #[test]
    fn test_trailing_crlf_accepted() {
        assert_eq!(parse_value(b"(1)\r\n").unwrap(), Value::list([Value::Number(1)]));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse_value(b"(1) 2").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_unclosed_list_position() {
        match parse_value(b"(1 2").unwrap_err() {
            Error::Parse { position, .. } => assert_eq!(position, 4),
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let mut input = vec![b'('; 100_000];
        input.extend_from_slice(b"\"text\"");
        let err = parse_value(&input).unwrap_err();
        match err {
            Error::Parse { position, .. } => assert_eq!(position, DEFAULT_MAX_NESTING),
            other => panic!("Expected parse error, got {other:?}"),
        }

        let nested = b"(((1)))";
        assert!(Reader::new(nested).with_max_nesting(3).read_value().is_ok());
        assert!(Reader::new(nested).with_max_nesting(2).read_value().is_err());
    }

    #[test]
    fn test_number_overflow() {
        assert!(parse_value(b"99999999999").is_err());
    }

    #[test]
    fn test_is_atom_char() {
        assert!(is_atom_char(b'A'));
        assert!(is_atom_char(b'z'));
        assert!(is_atom_char(b'0'));
        assert!(is_atom_char(b'\\'));
        assert!(is_atom_char(b']'));
        assert!(!is_atom_char(b' '));
        assert!(!is_atom_char(b'('));
        assert!(!is_atom_char(b')'));
        assert!(!is_atom_char(b'{'));
        assert!(!is_atom_char(b'"'));
        assert!(!is_atom_char(b'%'));
        assert!(!is_atom_char(b'*'));
    }
}
