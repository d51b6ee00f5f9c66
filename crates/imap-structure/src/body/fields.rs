//! Decoders for the body fields shared by single-part and multipart bodies.

use crate::Result;
use crate::decoder::Decoder;
use crate::value::Value;

use super::{Disposition, Extension, Extensions, Parameters};

/// Positional cursor over the elements of a body list.
///
/// Optional trailing fields are consumed strictly in order, each only if
/// elements remain.
pub struct Fields<'v> {
    items: &'v [Value],
    pos: usize,
}

impl<'v> Fields<'v> {
    /// Creates a cursor at the first element.
    pub const fn new(items: &'v [Value]) -> Self {
        Self { items, pos: 0 }
    }

    /// Returns the next element, if any.
    pub fn next_field(&mut self) -> Option<&'v Value> {
        let value = self.items.get(self.pos)?;
        self.pos += 1;
        Some(value)
    }

    /// Returns all remaining elements and moves to the end.
    pub fn rest(&mut self) -> &'v [Value] {
        let rest = self.items.get(self.pos..).unwrap_or_default();
        self.pos = self.items.len();
        rest
    }
}

/// Decodes `body-fld-param`: `NIL` or a list of attribute/value pairs.
pub fn decode_parameters(decoder: &Decoder<'_>, value: &Value) -> Result<Parameters> {
    let items = match value {
        Value::Nil => return Ok(Parameters::new()),
        Value::List(items) => items,
        other => return Err(decoder.unexpected("body-fld-param", other)),
    };

    if items.len() % 2 != 0 {
        // The dangling attribute is what makes the list malformed.
        return Err(decoder.unexpected("body-fld-param value", &items[items.len() - 1]));
    }

    let mut parameters = Parameters::new();
    for pair in items.chunks_exact(2) {
        let key = decoder.string("body-fld-param attribute", &pair[0])?;
        // Some servers send NIL values, e.g. `("boundary" NIL)`.
        let value = decoder.nstring("body-fld-param value", &pair[1])?;
        parameters.insert(key.to_vec(), value);
    }
    Ok(parameters)
}

/// Decodes `body-fld-dsp`: `NIL` or `(type parameters)`.
pub fn decode_disposition(decoder: &Decoder<'_>, value: &Value) -> Result<Option<Disposition>> {
    let items = match value {
        Value::Nil => return Ok(None),
        Value::List(items) => items,
        other => return Err(decoder.unexpected("body-fld-dsp", other)),
    };

    let [kind, parameters] = items.as_slice() else {
        return Err(decoder.field_count("body-fld-dsp", 2, items.len()));
    };

    let kind = decoder.string("body-fld-dsp type", kind)?.to_vec();
    let parameters = decode_parameters(decoder, parameters)?;
    Ok(Some(Disposition { kind, parameters }))
}

/// Decodes `body-fld-lang`: a single tag, `NIL`, or a list of tags.
pub fn decode_languages(decoder: &Decoder<'_>, value: &Value) -> Result<Vec<Vec<u8>>> {
    match value {
        Value::Nil => Ok(Vec::new()),
        Value::String(tag) => Ok(vec![tag.clone()]),
        Value::List(items) => items
            .iter()
            .map(|item| decoder.string("body-fld-lang", item).map(<[u8]>::to_vec))
            .collect(),
        other @ Value::Number(_) => Err(decoder.unexpected("body-fld-lang", other)),
    }
}

/// Decodes `body-fld-loc`: a string or `NIL`.
pub fn decode_location(decoder: &Decoder<'_>, value: &Value) -> Result<Vec<u8>> {
    decoder.nstring("body-fld-loc", value)
}

/// Collects whatever follows the known fields.
///
/// A single element is kept as is; several are kept as a list.
pub fn collect_extension(rest: &[Value]) -> Option<Extension> {
    let extension = match rest {
        [] => return None,
        [single] => Extension::Single(single.clone()),
        many => Extension::Multiple(many.to_vec()),
    };
    tracing::debug!(count = rest.len(), "Preserving body extension data");
    Some(extension)
}

/// Decodes disposition, language, location and extension data, in that
/// order, stopping wherever the list ends.
pub fn decode_extensions(decoder: &Decoder<'_>, fields: &mut Fields<'_>) -> Result<Extensions> {
    let mut extensions = Extensions::default();

    if let Some(value) = fields.next_field() {
        extensions.disposition = decode_disposition(decoder, value)?;
    }
    if let Some(value) = fields.next_field() {
        extensions.languages = decode_languages(decoder, value)?;
    }
    if let Some(value) = fields.next_field() {
        extensions.location = decode_location(decoder, value)?;
    }
    extensions.extension = collect_extension(fields.rest());

    Ok(extensions)
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
    use proptest::prelude::*;

    fn strings(items: &[&str]) -> Value {
        Value::list(items.iter().map(|s| Value::from(*s)))
    }

    #[test]
    fn test_parameters() {
        let decoder = Decoder::new(b"");
        let params = decode_parameters(
            &decoder,
            &strings(&["CHARSET", "US-ASCII", "NAME", "x.txt"]),
        )
        .unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(params[&b"CHARSET".to_vec()], b"US-ASCII");
        assert_eq!(params[&b"NAME".to_vec()], b"x.txt");
    }

    #[test]
    fn test_parameters_nil_and_empty() {
        let decoder = Decoder::new(b"");
        assert!(decode_parameters(&decoder, &Value::Nil).unwrap().is_empty());
        assert!(
            decode_parameters(&decoder, &Value::List(Vec::new()))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_parameters_duplicate_last_wins() {
        let decoder = Decoder::new(b"");
        let params =
            decode_parameters(&decoder, &strings(&["NAME", "first", "NAME", "second"])).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[&b"NAME".to_vec()], b"second");
    }

    #[test]
    fn test_parameters_nil_value() {
        let decoder = Decoder::new(b"");
        let value = Value::list([Value::from("boundary"), Value::Nil]);
        let params = decode_parameters(&decoder, &value).unwrap();
        assert_eq!(params[&b"boundary".to_vec()], b"");
    }

    #[test]
    fn test_parameters_wrong_kind() {
        let decoder = Decoder::new(b"");
        let value = Value::list([Value::from("a"), Value::Number(1)]);
        assert_eq!(
            decode_parameters(&decoder, &value).unwrap_err().kind(),
            ErrorKind::UnexpectedType
        );

        let value = Value::list([Value::Nil, Value::from("b")]);
        assert_eq!(
            decode_parameters(&decoder, &value).unwrap_err().kind(),
            ErrorKind::UnexpectedType
        );

        assert_eq!(
            decode_parameters(&decoder, &Value::from("x")).unwrap_err().kind(),
            ErrorKind::UnexpectedType
        );
    }

    #[test]
    fn test_disposition() {
        let decoder = Decoder::new(b"");
        let value = Value::list([
            Value::from("ATTACHMENT"),
            strings(&["FILENAME", "report.pdf"]),
        ]);

        let disposition = decode_disposition(&decoder, &value).unwrap().unwrap();
        assert_eq!(disposition.kind, b"ATTACHMENT");
        assert_eq!(disposition.parameters[&b"FILENAME".to_vec()], b"report.pdf");

        let value = Value::list([Value::from("INLINE"), Value::Nil]);
        let disposition = decode_disposition(&decoder, &value).unwrap().unwrap();
        assert!(disposition.parameters.is_empty());

        assert!(decode_disposition(&decoder, &Value::Nil).unwrap().is_none());
    }

    #[test]
    fn test_disposition_malformed() {
        let decoder = Decoder::new(b"");

        let err = decode_disposition(&decoder, &strings(&["INLINE"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldCount);

        let value = Value::list([Value::Number(1), Value::Nil]);
        let err = decode_disposition(&decoder, &value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);

        let value = Value::list([Value::from("INLINE"), Value::from("x")]);
        let err = decode_disposition(&decoder, &value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);

        let err = decode_disposition(&decoder, &Value::from("INLINE")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
    }

    #[test]
    fn test_languages() {
        let decoder = Decoder::new(b"");

        let single = decode_languages(&decoder, &Value::from("en")).unwrap();
        assert_eq!(single, vec![b"en".to_vec()]);

        let many = decode_languages(&decoder, &strings(&["en", "de"])).unwrap();
        assert_eq!(many, vec![b"en".to_vec(), b"de".to_vec()]);

        assert!(decode_languages(&decoder, &Value::Nil).unwrap().is_empty());

        let err = decode_languages(&decoder, &Value::Number(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);

        let nested = Value::list([Value::from("en"), Value::List(Vec::new())]);
        let err = decode_languages(&decoder, &nested).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
    }

    #[test]
    fn test_location() {
        let decoder = Decoder::new(b"");
        assert_eq!(
            decode_location(&decoder, &Value::from("http://example.org/a")).unwrap(),
            b"http://example.org/a"
        );
        assert!(decode_location(&decoder, &Value::Nil).unwrap().is_empty());
        assert!(decode_location(&decoder, &Value::List(Vec::new())).is_err());
    }

    #[test]
    fn test_collect_extension() {
        assert_eq!(collect_extension(&[]), None);
        assert_eq!(
            collect_extension(&[Value::from("x")]),
            Some(Extension::Single(Value::from("x")))
        );
        let nested = Value::list([Value::Number(1)]);
        assert_eq!(
            collect_extension(&[nested.clone()]),
            Some(Extension::Single(nested))
        );
        assert_eq!(
            collect_extension(&[Value::Nil, Value::Number(2)]),
            Some(Extension::Multiple(vec![Value::Nil, Value::Number(2)]))
        );
    }

    #[test]
    fn test_extensions_stop_at_end() {
        let decoder = Decoder::new(b"");
        let items = [Value::Nil, Value::from("en")];
        let mut fields = Fields::new(&items);

        let extensions = decode_extensions(&decoder, &mut fields).unwrap();
        assert!(extensions.disposition.is_none());
        assert_eq!(extensions.languages, vec![b"en".to_vec()]);
        assert!(extensions.location.is_empty());
        assert!(extensions.extension.is_none());
    }

    proptest! {
        #[test]
        fn prop_odd_parameter_list_rejected(len in 0usize..16) {
            let items = vec![Value::from("x"); 2 * len + 1];
            let err = decode_parameters(&Decoder::new(b""), &Value::List(items)).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::UnexpectedType);
        }
    }
}
