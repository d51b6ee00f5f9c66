//! Envelope addresses.

use std::fmt;

use crate::Result;
use crate::decoder::Decoder;
use crate::value::Value;

/// Email address from an envelope.
///
/// All fields are raw bytes as sent by the server. RFC 2047 encoded words in
/// the display name are not decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Address {
    /// Display name.
    pub name: Vec<u8>,
    /// Source route (obsolete).
    pub adl: Vec<u8>,
    /// Mailbox name (local part), or the group name of a group start marker.
    pub mailbox: Vec<u8>,
    /// Host name (domain part).
    ///
    /// `None` marks RFC 2822 group syntax: a group start if `mailbox` holds
    /// the group name, a group end if `mailbox` is empty.
    pub host: Option<Vec<u8>>,
}

impl Address {
    /// Creates an address with a host.
    #[must_use]
    pub fn new(
        name: impl Into<Vec<u8>>,
        mailbox: impl Into<Vec<u8>>,
        host: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            adl: Vec::new(),
            mailbox: mailbox.into(),
            host: Some(host.into()),
        }
    }

    /// Returns the full email address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.host.as_ref().map(|host| {
            format!(
                "{}@{}",
                String::from_utf8_lossy(&self.mailbox),
                String::from_utf8_lossy(host)
            )
        })
    }

    /// Returns true if this is a group start or end marker.
    #[must_use]
    pub const fn is_group_marker(&self) -> bool {
        self.host.is_none()
    }

    /// Returns true if this starts a named group.
    #[must_use]
    pub fn is_group_start(&self) -> bool {
        self.host.is_none() && !self.mailbox.is_empty()
    }

    /// Returns true if this ends a group.
    #[must_use]
    pub fn is_group_end(&self) -> bool {
        self.host.is_none() && self.mailbox.is_empty()
    }
}

/// Formats as `"name" <mailbox@host>`, or `"name" <mailbox>` for group
/// markers.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" <{}",
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.mailbox)
        )?;
        if let Some(host) = &self.host {
            write!(f, "@{}", String::from_utf8_lossy(host))?;
        }
        f.write_str(">")
    }
}

/// Decodes an address list: `NIL` or a list of address tuples.
pub(crate) fn decode_address_list(decoder: &Decoder<'_>, value: &Value) -> Result<Vec<Address>> {
    match value {
        Value::Nil => Ok(Vec::new()),
        Value::List(items) => items
            .iter()
            .map(|item| {
                let tuple = decoder.list("address", item)?;
                decode_address(decoder, tuple)
            })
            .collect(),
        other => Err(decoder.unexpected("address list", other)),
    }
}

/// Decodes a `(name adl mailbox host)` tuple.
pub(crate) fn decode_address(decoder: &Decoder<'_>, items: &[Value]) -> Result<Address> {
    let [name, adl, mailbox, host] = items else {
        return Err(decoder.field_count("address", 4, items.len()));
    };

    let name = decoder.nstring("addr-name", name)?;
    let adl = decoder.nstring("addr-adl", adl)?;
    let mailbox = decoder.nstring("addr-mailbox", mailbox)?;
    let host = match host {
        Value::Nil => None,
        other => Some(decoder.string("addr-host", other)?.to_vec()),
    };

    Ok(Address {
        name,
        adl,
        mailbox,
        host,
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
    use proptest::prelude::*;

    fn tuple(name: &str, adl: &str, mailbox: &str, host: Option<&str>) -> Value {
        Value::list([
            Value::from(name),
            Value::from(adl),
            Value::from(mailbox),
            Value::from(host),
        ])
    }

    #[test]
    fn test_decode_address() {
        let decoder = Decoder::new(b"");
        let list = Value::list([tuple("Terry Gray", "", "gray", Some("cac.washington.edu"))]);

        let addresses = decoder.address_list(&list).unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].name, b"Terry Gray");
        assert_eq!(addresses[0].mailbox, b"gray");
        assert_eq!(addresses[0].host.as_deref(), Some(&b"cac.washington.edu"[..]));
        assert_eq!(
            addresses[0].email(),
            Some("gray@cac.washington.edu".to_string())
        );
    }

    #[test]
    fn test_nil_list_is_empty() {
        let decoder = Decoder::new(b"");
        assert!(decoder.address_list(&Value::Nil).unwrap().is_empty());
        assert!(decoder.address_list(&Value::List(Vec::new())).unwrap().is_empty());
    }

    #[test]
    fn test_nil_host_differs_from_empty_host() {
        let decoder = Decoder::new(b"");
        let list = Value::list([
            tuple("", "", "group", None),
            tuple("", "", "user", Some("")),
            Value::list([Value::Nil, Value::Nil, Value::Nil, Value::Nil]),
        ]);

        let addresses = decoder.address_list(&list).unwrap();
        assert_eq!(addresses[0].host, None);
        assert_eq!(addresses[1].host, Some(Vec::new()));
        assert_ne!(
            addresses[0],
            Address {
                mailbox: b"group".to_vec(),
                host: Some(Vec::new()),
                ..Address::default()
            }
        );
        assert!(addresses[0].is_group_start());
        assert!(!addresses[1].is_group_marker());
        assert!(addresses[2].is_group_end());
        assert!(addresses[2].name.is_empty());
    }

    #[test]
    fn test_list_of_wrong_kind() {
        let decoder = Decoder::new(b"");
        let err = decoder.address_list(&Value::from("x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);

        let err = decoder.address_list(&Value::Number(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
    }

    #[test]
    fn test_element_not_a_list() {
        let decoder = Decoder::new(b"");
        let list = Value::list([tuple("a", "", "b", Some("c")), Value::from("oops")]);
        let err = decoder.address_list(&list).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
    }

    #[test]
    fn test_wrong_arity() {
        let decoder = Decoder::new(b"");
        for len in [0, 3, 5] {
            let items = vec![Value::Nil; len];
            let err = decoder.address(&items).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::FieldCount);
        }
    }

    #[test]
    fn test_wrong_field_kind() {
        let decoder = Decoder::new(b"");
        let items = [Value::from("a"), Value::Nil, Value::List(Vec::new()), Value::from("h")];
        let err = decoder.address(&items).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);

        let items = [Value::from("a"), Value::Nil, Value::from("m"), Value::Number(1)];
        let err = decoder.address(&items).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
    }

    #[test]
    fn test_display() {
        let address = Address::new("Fred Foobar", "foobar", "blurdybloop.com");
        assert_eq!(address.to_string(), "\"Fred Foobar\" <foobar@blurdybloop.com>");

        let group = Address {
            mailbox: b"undisclosed-recipients".to_vec(),
            ..Address::default()
        };
        assert_eq!(group.to_string(), "\"\" <undisclosed-recipients>");
    }

    proptest! {
        #[test]
        fn prop_order_and_fields_preserved(
            entries in proptest::collection::vec(
                ("[a-zA-Z ]{0,12}", "[a-z@,]{0,6}", "[a-z.]{1,10}", proptest::option::of("[a-z.]{0,10}")),
                0..8,
            )
        ) {
            let decoder = Decoder::new(b"");
            let list = Value::list(entries.iter().map(|(n, a, m, h)| {
                tuple(n, a, m, h.as_deref())
            }));

            let addresses = decoder.address_list(&list).unwrap();
            prop_assert_eq!(addresses.len(), entries.len());
            for (address, (n, a, m, h)) in addresses.iter().zip(&entries) {
                prop_assert_eq!(&address.name, n.as_bytes());
                prop_assert_eq!(&address.adl, a.as_bytes());
                prop_assert_eq!(&address.mailbox, m.as_bytes());
                prop_assert_eq!(address.host.as_deref(), h.as_deref().map(str::as_bytes));
            }
        }
    }
}
