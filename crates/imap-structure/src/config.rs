//! Decoder configuration types.

use chrono::{DateTime, FixedOffset};

use crate::datetime;

/// Signature of the function used to parse envelope dates.
///
/// Returns `None` when the input is not a usable date; the envelope then
/// carries no date.
pub type DateParser = fn(&[u8]) -> Option<DateTime<FixedOffset>>;

/// Default limit on nested parts and embedded messages.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options controlling structure decoding.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Maximum nesting depth of multipart children and embedded messages.
    pub max_depth: usize,
    /// Envelope date parser.
    pub date_parser: DateParser,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            date_parser: datetime::parse_rfc2822,
        }
    }
}

impl DecodeOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an options builder.
    #[must_use]
    pub fn builder() -> DecodeOptionsBuilder {
        DecodeOptionsBuilder::new()
    }
}

/// Builder for decode options.
#[derive(Debug, Clone)]
pub struct DecodeOptionsBuilder {
    max_depth: usize,
    date_parser: DateParser,
}

impl Default for DecodeOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptionsBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            date_parser: datetime::parse_rfc2822,
        }
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the envelope date parser.
    #[must_use]
    pub const fn date_parser(mut self, parser: DateParser) -> Self {
        self.date_parser = parser;
        self
    }

    /// Builds the options.
    #[must_use]
    pub const fn build(self) -> DecodeOptions {
        DecodeOptions {
            max_depth: self.max_depth,
            date_parser: self.date_parser,
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

    fn never(_: &[u8]) -> Option<DateTime<FixedOffset>> {
        None
    }

    #[test]
    fn test_defaults() {
        let options = DecodeOptions::new();
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert!((options.date_parser)(b"Mon, 7 Feb 1994 21:52:25 -0800").is_some());
    }

    #[test]
    fn test_builder() {
        let options = DecodeOptions::builder()
            .max_depth(4)
            .date_parser(never)
            .build();

        assert_eq!(options.max_depth, 4);
        assert!((options.date_parser)(b"Mon, 7 Feb 1994 21:52:25 -0800").is_none());
    }
}
