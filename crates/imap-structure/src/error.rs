//! Error types for structure decoding.

use std::fmt;

use thiserror::Error;

use crate::value::ValueKind;

/// Where in the source response an error was detected.
///
/// The line is the raw response line the value tree was tokenized from and
/// the offset is a byte position inside it. Both are carried for diagnostics
/// only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// Raw source line.
    pub line: Vec<u8>,
    /// Byte offset into `line`.
    pub offset: usize,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub fn new(line: impl Into<Vec<u8>>, offset: usize) -> Self {
        Self {
            line: line.into(),
            offset,
        }
    }

    /// Returns a short excerpt of the line around the offset.
    #[must_use]
    pub fn excerpt(&self) -> String {
        const CONTEXT: usize = 20;
        let start = self.offset.saturating_sub(CONTEXT).min(self.line.len());
        let end = self.offset.saturating_add(CONTEXT).min(self.line.len());
        String::from_utf8_lossy(&self.line[start..end]).into_owned()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.offset)
    }
}

/// Errors that can occur while decoding a structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The list is too short to be any valid form at this position.
    #[error("No data at {at}: {message}")]
    NoData {
        /// What was being decoded.
        message: String,
        /// Diagnostic location.
        at: Location,
    },

    /// A fixed-arity list has the wrong number of elements.
    #[error("Wrong field count at {at}: {what} needs {expected} fields, got {actual}")]
    FieldCount {
        /// What was being decoded.
        what: &'static str,
        /// Expected number of elements.
        expected: usize,
        /// Actual number of elements.
        actual: usize,
        /// Diagnostic location.
        at: Location,
    },

    /// An element has the wrong kind.
    #[error("Unexpected {found} at {at}: expected {expected}")]
    UnexpectedType {
        /// Description of the expected element.
        expected: &'static str,
        /// Kind that was found instead.
        found: ValueKind,
        /// Diagnostic location.
        at: Location,
    },

    /// Nesting exceeded the configured recursion limit.
    #[error("Nesting deeper than {limit} levels at {at}")]
    DepthExceeded {
        /// Configured limit.
        limit: usize,
        /// Diagnostic location.
        at: Location,
    },

    /// The wire text could not be tokenized.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },
}

/// Fieldless discriminant of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::NoData`].
    NoData,
    /// See [`Error::FieldCount`].
    FieldCount,
    /// See [`Error::UnexpectedType`].
    UnexpectedType,
    /// See [`Error::DepthExceeded`].
    DepthExceeded,
    /// See [`Error::Parse`].
    Parse,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoData { .. } => ErrorKind::NoData,
            Self::FieldCount { .. } => ErrorKind::FieldCount,
            Self::UnexpectedType { .. } => ErrorKind::UnexpectedType,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::Parse { .. } => ErrorKind::Parse,
        }
    }

    /// Returns the diagnostic location, if the error carries one.
    #[must_use]
    pub const fn location(&self) -> Option<&Location> {
        match self {
            Self::NoData { at, .. }
            | Self::FieldCount { at, .. }
            | Self::UnexpectedType { at, .. }
            | Self::DepthExceeded { at, .. } => Some(at),
            Self::Parse { .. } => None,
        }
    }

    /// Returns the byte offset the error refers to.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::Parse { position, .. } => *position,
            _ => self.location().map_or(0, |at| at.offset),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

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
    fn test_kind_and_location() {
        let err = Error::UnexpectedType {
            expected: "body-fld-octets",
            found: ValueKind::String,
            at: Location::new(&b"* 1 FETCH (BODY (...))"[..], 11),
        };
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
        assert_eq!(err.offset(), 11);
        assert_eq!(err.to_string(), "Unexpected string at offset 11: expected body-fld-octets");
    }

    #[test]
    fn test_parse_has_no_location() {
        let err = Error::Parse {
            position: 3,
            message: "bad".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.location().is_none());
        assert_eq!(err.offset(), 3);
    }

    #[test]
    fn test_excerpt_clamps() {
        let at = Location::new(&b"short"[..], 100);
        assert_eq!(at.excerpt(), "");
        let at = Location::new(&b"short"[..], usize::MAX);
        assert_eq!(at.excerpt(), "");
        let at = Location::new(&b"0123456789"[..], 5);
        assert_eq!(at.excerpt(), "0123456789");
    }
}
