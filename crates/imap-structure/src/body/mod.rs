//! Body structure types.
//!
//! A [`MessagePart`] mirrors the nested `BODYSTRUCTURE` list: multipart
//! containers own their children, and an embedded `message/rfc822` part owns
//! the structure of the encapsulated message.

pub(crate) mod decode;
pub(crate) mod fields;

use std::collections::BTreeMap;

use crate::envelope::Envelope;
use crate::value::Value;

/// Body parameters (`body-fld-param`), keyed by the attribute as sent.
///
/// If a server repeats an attribute, the last value wins.
pub type Parameters = BTreeMap<Vec<u8>, Vec<u8>>;

/// Content-Disposition (`body-fld-dsp`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Disposition {
    /// Disposition type, e.g. `attachment`, as sent.
    pub kind: Vec<u8>,
    /// Disposition parameters.
    pub parameters: Parameters,
}

impl Disposition {
    /// Returns true for an `attachment` disposition.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind.eq_ignore_ascii_case(b"attachment")
    }

    /// Returns true for an `inline` disposition.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.kind.eq_ignore_ascii_case(b"inline")
    }
}

/// Extension data after the last known field (`body-extension`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// Exactly one trailing element, stored as sent.
    Single(Value),
    /// Several trailing elements, in order.
    Multiple(Vec<Value>),
}

impl Extension {
    /// Returns the trailing elements as a slice.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        }
    }
}

/// Optional trailing fields shared by single-part and multipart bodies.
///
/// Each field is only filled if the server sent it; a response that ends
/// early leaves the rest at their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extensions {
    /// Content-Disposition.
    pub disposition: Option<Disposition>,
    /// Content-Language tags.
    pub languages: Vec<Vec<u8>>,
    /// Content-Location.
    pub location: Vec<u8>,
    /// Unknown extension data.
    pub extension: Option<Extension>,
}

/// Fields common to all single-part bodies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyFields {
    /// Media type, lowercased.
    pub media_type: String,
    /// Media subtype, lowercased.
    pub media_subtype: String,
    /// Content-Type parameters.
    pub parameters: Parameters,
    /// Content-ID.
    pub id: Vec<u8>,
    /// Content-Description.
    pub description: Vec<u8>,
    /// Content-Transfer-Encoding, as sent.
    pub encoding: Vec<u8>,
    /// Body size in octets.
    pub octets: u32,
    /// Content-MD5.
    pub md5: Vec<u8>,
    /// Optional trailing fields.
    pub extensions: Extensions,
}

/// One node of a message's MIME structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    /// Any single part that is neither text nor an embedded message.
    Basic {
        /// Common fields.
        fields: BodyFields,
    },
    /// A `text/*` part.
    Text {
        /// Common fields.
        fields: BodyFields,
        /// Size in lines.
        lines: u32,
    },
    /// A `message/rfc822` part.
    Message {
        /// Common fields.
        fields: BodyFields,
        /// Envelope of the embedded message.
        envelope: Box<Envelope>,
        /// Structure of the embedded message.
        body: Box<Self>,
        /// Size in lines.
        lines: u32,
    },
    /// A `multipart/*` container.
    Multipart {
        /// Child parts, in MIME order.
        children: Vec<Self>,
        /// Multipart subtype, lowercased.
        media_subtype: String,
        /// Content-Type parameters.
        parameters: Parameters,
        /// Optional trailing fields.
        extensions: Extensions,
    },
}

impl MessagePart {
    /// Returns the single-part fields, or `None` for multipart bodies.
    #[must_use]
    pub const fn fields(&self) -> Option<&BodyFields> {
        match self {
            Self::Basic { fields } | Self::Text { fields, .. } | Self::Message { fields, .. } => {
                Some(fields)
            }
            Self::Multipart { .. } => None,
        }
    }

    /// Returns the media type; `multipart` for multipart bodies.
    #[must_use]
    pub fn media_type(&self) -> &str {
        self.fields().map_or("multipart", |f| f.media_type.as_str())
    }

    /// Returns the media subtype.
    #[must_use]
    pub fn media_subtype(&self) -> &str {
        match self {
            Self::Multipart { media_subtype, .. } => media_subtype,
            _ => self.fields().map_or("", |f| f.media_subtype.as_str()),
        }
    }

    /// Returns `type/subtype`.
    #[must_use]
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.media_type(), self.media_subtype())
    }

    /// Returns true for multipart bodies.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }

    /// Returns the Content-Type parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        match self {
            Self::Basic { fields } | Self::Text { fields, .. } | Self::Message { fields, .. } => {
                &fields.parameters
            }
            Self::Multipart { parameters, .. } => parameters,
        }
    }

    /// Looks up a Content-Type parameter, ignoring ASCII case of the name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&[u8]> {
        self.parameters()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, value)| value.as_slice())
    }

    /// Returns the optional trailing fields.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        match self {
            Self::Basic { fields } | Self::Text { fields, .. } | Self::Message { fields, .. } => {
                &fields.extensions
            }
            Self::Multipart { extensions, .. } => extensions,
        }
    }

    /// Returns the Content-Disposition.
    #[must_use]
    pub const fn disposition(&self) -> Option<&Disposition> {
        self.extensions().disposition.as_ref()
    }

    /// Returns the Content-Language tags.
    #[must_use]
    pub fn languages(&self) -> &[Vec<u8>] {
        &self.extensions().languages
    }

    /// Returns the Content-Location.
    #[must_use]
    pub fn location(&self) -> &[u8] {
        &self.extensions().location
    }

    /// Returns unknown extension data.
    #[must_use]
    pub const fn extension(&self) -> Option<&Extension> {
        self.extensions().extension.as_ref()
    }

    /// Returns the body size in octets of a single part.
    #[must_use]
    pub fn octets(&self) -> Option<u32> {
        self.fields().map(|f| f.octets)
    }

    /// Returns the size in lines of text and embedded message parts.
    #[must_use]
    pub const fn lines(&self) -> Option<u32> {
        match self {
            Self::Text { lines, .. } | Self::Message { lines, .. } => Some(*lines),
            Self::Basic { .. } | Self::Multipart { .. } => None,
        }
    }

    /// Returns the children of a multipart body; empty otherwise.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Multipart { children, .. } => children,
            _ => &[],
        }
    }

    /// Returns the envelope of an embedded message.
    #[must_use]
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Message { envelope, .. } => Some(envelope),
            _ => None,
        }
    }

    /// Returns the structure of an embedded message.
    #[must_use]
    pub fn embedded_body(&self) -> Option<&Self> {
        match self {
            Self::Message { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Resolves an IMAP part number such as `[2, 1]` (section `2.1`).
    ///
    /// `self` is taken to be the body of a message, as returned for a
    /// top-level `BODYSTRUCTURE`. The empty path is `self`. A body that is
    /// not multipart is its own part 1. Part numbers below an embedded
    /// message address the parts of the encapsulated message.
    #[must_use]
    pub fn part(&self, path: &[u32]) -> Option<&Self> {
        let Some((&first, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            Self::Multipart { children, .. } => {
                let index = usize::try_from(first).ok()?.checked_sub(1)?;
                children.get(index)?.descend(rest)
            }
            _ if first == 1 => self.descend(rest),
            _ => None,
        }
    }

    /// Resolves the remaining part numbers below a part that was already
    /// reached.
    fn descend(&self, rest: &[u32]) -> Option<&Self> {
        if rest.is_empty() {
            return Some(self);
        }
        match self {
            Self::Multipart { .. } => self.part(rest),
            Self::Message { body, .. } => body.part(rest),
            Self::Basic { .. } | Self::Text { .. } => None,
        }
    }

    /// Resolves a dotted section specifier such as `"1.2.3"`.
    ///
    /// The empty string is the whole body. Returns `None` if the specifier
    /// is malformed or names a part that does not exist.
    #[must_use]
    pub fn find_section(&self, section: &str) -> Option<&Self> {
        if section.is_empty() {
            return Some(self);
        }
        let path = section
            .split('.')
            .map(|n| n.parse::<u32>().ok().filter(|&n| n > 0))
            .collect::<Option<Vec<_>>>()?;
        self.part(&path)
    }

    /// Lists every part depth-first together with its part number.
    ///
    /// The first entry is `self` with an empty path. The multipart body of an
    /// embedded message is not listed separately; its children follow the
    /// message part directly.
    ///
    /// A body that is not multipart is listed once, under the empty path,
    /// even though [`part`](Self::part) also resolves `[1]` to it.
    #[must_use]
    pub fn walk(&self) -> Vec<(Vec<u32>, &Self)> {
        let mut out = vec![(Vec::new(), self)];
        self.collect_parts(&mut Vec::new(), &mut out);
        out
    }

    fn collect_parts<'a>(&'a self, path: &mut Vec<u32>, out: &mut Vec<(Vec<u32>, &'a Self)>) {
        match self {
            Self::Multipart { children, .. } => {
                for (number, child) in (1..).zip(children) {
                    path.push(number);
                    out.push((path.clone(), child));
                    child.collect_parts(path, out);
                    path.pop();
                }
            }
            Self::Message { body, .. } => {
                if body.is_multipart() {
                    body.collect_parts(path, out);
                } else {
                    path.push(1);
                    out.push((path.clone(), body));
                    body.collect_parts(path, out);
                    path.pop();
                }
            }
            Self::Basic { .. } | Self::Text { .. } => {}
        }
    }
}

/// Formats a dotted section specifier from a part number.
#[must_use]
pub fn section_name(path: &[u32]) -> String {
    path.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
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

    fn text(subtype: &str) -> MessagePart {
        MessagePart::Text {
            fields: BodyFields {
                media_type: "text".to_string(),
                media_subtype: subtype.to_string(),
                ..BodyFields::default()
            },
            lines: 1,
        }
    }

    fn image() -> MessagePart {
        MessagePart::Basic {
            fields: BodyFields {
                media_type: "image".to_string(),
                media_subtype: "png".to_string(),
                ..BodyFields::default()
            },
        }
    }

    fn multipart(subtype: &str, children: Vec<MessagePart>) -> MessagePart {
        MessagePart::Multipart {
            children,
            media_subtype: subtype.to_string(),
            parameters: Parameters::new(),
            extensions: Extensions::default(),
        }
    }

    fn message(body: MessagePart) -> MessagePart {
        MessagePart::Message {
            fields: BodyFields {
                media_type: "message".to_string(),
                media_subtype: "rfc822".to_string(),
                ..BodyFields::default()
            },
            envelope: Box::default(),
            body: Box::new(body),
            lines: 10,
        }
    }

    /// Structure used in the RFC 3501 section 6.4.5 example.
    fn rfc3501_tree() -> MessagePart {
        multipart(
            "mixed",
            vec![
                text("plain"),
                image(),
                message(multipart("mixed", vec![text("plain"), image()])),
                multipart("alternative", vec![text("plain"), text("html")]),
            ],
        )
    }

    #[test]
    fn test_accessors() {
        let part = text("plain");
        assert_eq!(part.media_type(), "text");
        assert_eq!(part.mime_type(), "text/plain");
        assert_eq!(part.lines(), Some(1));
        assert!(part.children().is_empty());

        let tree = rfc3501_tree();
        assert_eq!(tree.media_type(), "multipart");
        assert_eq!(tree.mime_type(), "multipart/mixed");
        assert_eq!(tree.children().len(), 4);
        assert!(tree.fields().is_none());
        assert!(tree.octets().is_none());
    }

    #[test]
    fn test_parameter_lookup_ignores_case() {
        let mut part = text("plain");
        if let MessagePart::Text { fields, .. } = &mut part {
            fields
                .parameters
                .insert(b"CHARSET".to_vec(), b"US-ASCII".to_vec());
        }
        assert_eq!(part.parameter("charset"), Some(&b"US-ASCII"[..]));
        assert_eq!(part.parameter("name"), None);
    }

    #[test]
    fn test_sections() {
        let tree = rfc3501_tree();

        assert_eq!(tree.find_section("").unwrap(), &tree);
        assert_eq!(tree.find_section("1").unwrap().mime_type(), "text/plain");
        assert_eq!(tree.find_section("2").unwrap().mime_type(), "image/png");
        assert_eq!(
            tree.find_section("3").unwrap().mime_type(),
            "message/rfc822"
        );
        assert_eq!(tree.find_section("3.1").unwrap().mime_type(), "text/plain");
        assert_eq!(tree.find_section("3.2").unwrap().mime_type(), "image/png");
        assert_eq!(
            tree.find_section("4").unwrap().mime_type(),
            "multipart/alternative"
        );
        assert_eq!(tree.find_section("4.2").unwrap().mime_type(), "text/html");

        assert!(tree.find_section("5").is_none());
        assert!(tree.find_section("0").is_none());
        assert!(tree.find_section("1.1").is_none());
        assert!(tree.find_section("x").is_none());
        assert!(tree.find_section("4.").is_none());
    }

    #[test]
    fn test_single_part_is_part_one() {
        let part = text("plain");
        assert_eq!(part.find_section("1").unwrap(), &part);
        assert!(part.find_section("2").is_none());

        let embedded = message(text("plain"));
        assert_eq!(embedded.find_section("1").unwrap(), &embedded);
        assert_eq!(
            embedded.find_section("1.1").unwrap().mime_type(),
            "text/plain"
        );
    }

    #[test]
    fn test_walk_matches_sections() {
        let tree = rfc3501_tree();
        let parts = tree.walk();

        let names: Vec<String> = parts.iter().map(|(path, _)| section_name(path)).collect();
        assert_eq!(names, ["", "1", "2", "3", "3.1", "3.2", "4", "4.1", "4.2"]);
        for (path, part) in &parts {
            assert_eq!(tree.part(path).unwrap(), *part);
        }
    }

    #[test]
    fn test_walk_single_part_root() {
        let root = text("plain");
        let parts = root.walk();

        assert_eq!(parts.len(), 1);
        assert!(parts[0].0.is_empty());
        assert_eq!(parts[0].1, &root);
        assert_eq!(root.find_section("1").unwrap(), &root);
        assert_eq!(root.find_section(""), root.find_section("1"));
    }

    #[test]
    fn test_extension_values() {
        let single = Extension::Single(Value::Number(1));
        assert_eq!(single.values(), &[Value::Number(1)]);

        let multiple = Extension::Multiple(vec![Value::Nil, Value::Number(2)]);
        assert_eq!(multiple.values().len(), 2);
    }

    #[test]
    fn test_disposition_kind() {
        let disposition = Disposition {
            kind: b"ATTACHMENT".to_vec(),
            parameters: Parameters::new(),
        };
        assert!(disposition.is_attachment());
        assert!(!disposition.is_inline());
    }
}
