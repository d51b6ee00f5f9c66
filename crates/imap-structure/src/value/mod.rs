//! Generic IMAP value tree.
//!
//! A tokenized IMAP response is a tree of four kinds of values: `NIL`,
//! byte strings (atoms, quoted strings and literals), unsigned numbers and
//! parenthesized lists. The decoders in this crate consume this tree; they
//! never look at wire bytes directly.

pub mod reader;

use std::fmt;

pub use reader::{Reader, parse_value};

/// A single node of a tokenized IMAP response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// `NIL`.
    Nil,
    /// Atom, quoted string or literal.
    String(Vec<u8>),
    /// Unsigned number.
    Number(u32),
    /// Parenthesized list.
    List(Vec<Self>),
}

/// The kind of a [`Value`], without its payload.
///
/// Used in diagnostics to report what was found where something else was
/// expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `NIL`.
    Nil,
    /// Byte string.
    String,
    /// Unsigned number.
    Number,
    /// List.
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nil => "NIL",
            Self::String => "string",
            Self::Number => "number",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Creates a string value.
    #[must_use]
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Self::String(bytes.into())
    }

    /// Creates a list value.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Nil => ValueKind::Nil,
            Self::String(_) => ValueKind::String,
            Self::Number(_) => ValueKind::Number,
            Self::List(_) => ValueKind::List,
        }
    }

    /// Returns true for `NIL`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true for lists.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the bytes of a string value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes of a string value, mapping `NIL` to `Some(&[])`.
    ///
    /// This is the IMAP `nstring`.
    #[must_use]
    pub fn as_nstring(&self) -> Option<&[u8]> {
        match self {
            Self::Nil => Some(&[]),
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number of a numeric value.
    #[must_use]
    pub const fn as_number(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the items of a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Coerces a scalar to bytes.
    ///
    /// Strings are returned as is, numbers in decimal, `NIL` and lists as
    /// empty bytes.
    #[must_use]
    pub fn to_bytes_lossy(&self) -> Vec<u8> {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string().into_bytes(),
            Self::Nil | Self::List(_) => Vec::new(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.as_bytes().to_vec())
    }
}

impl From<&[u8]> for Value {
    fn from(s: &[u8]) -> Self {
        Self::String(s.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(s: Vec<u8>) -> Self {
        Self::String(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

/// Writes the value in IMAP syntax.
///
/// Strings are always written quoted; this is for diagnostics and does not
/// produce literals.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("NIL"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => {
                f.write_str("\"")?;
                for c in String::from_utf8_lossy(s).chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
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
    fn test_kind() {
        assert_eq!(Value::Nil.kind(), ValueKind::Nil);
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::Number(7).kind(), ValueKind::Number);
        assert_eq!(Value::List(Vec::new()).kind(), ValueKind::List);
    }

    #[test]
    fn test_nstring() {
        assert_eq!(Value::Nil.as_nstring(), Some(&b""[..]));
        assert_eq!(Value::from("abc").as_nstring(), Some(&b"abc"[..]));
        assert_eq!(Value::Number(1).as_nstring(), None);
        assert_eq!(Value::Nil.as_bytes(), None);
    }

    #[test]
    fn test_to_bytes_lossy() {
        assert_eq!(Value::Number(42).to_bytes_lossy(), b"42");
        assert_eq!(Value::Nil.to_bytes_lossy(), b"");
        assert_eq!(Value::list([Value::from("a")]).to_bytes_lossy(), b"");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<&str>), Value::Nil);
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }

    #[test]
    fn test_display() {
        let value = Value::list([
            Value::from("TEXT"),
            Value::Nil,
            Value::Number(12),
            Value::list([Value::from("say \"hi\"")]),
        ]);
        assert_eq!(value.to_string(), r#"("TEXT" NIL 12 ("say \"hi\""))"#);
    }
}
