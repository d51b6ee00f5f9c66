//! Integration tests decoding real-world `FETCH` responses.
//!
//! The responses are fed through the wire reader exactly as a client would
//! receive them, then decoded and inspected through the public API only.

#![allow(clippy::unwrap_used)]

use imap_structure::{
    Decoder, DecodeOptions, ErrorKind, Extension, MessagePart, Value, parse_body_structure,
    parse_envelope, section_name,
};

/// Byte offset of the value following `item ` in `line`.
fn offset_after(line: &[u8], item: &str) -> usize {
    let needle = format!("{item} ");
    line.windows(needle.len())
        .position(|w| w == needle.as_bytes())
        .unwrap()
        + needle.len()
}

/// BODYSTRUCTURE example from RFC 3501, section 7.4.2.
const RFC3501_BODYSTRUCTURE: &[u8] = br#"(("TEXT" "PLAIN" ("CHARSET" "US-ASCII") NIL NIL "7BIT" 1152 23)("TEXT" "PLAIN" ("CHARSET" "US-ASCII" "NAME" "cc.diff") "<960723163407.20117h@cac.washington.edu>" "Compiler diff" "BASE64" 4554 73) "MIXED")"#;

#[test]
fn test_rfc3501_bodystructure() {
    let body = parse_body_structure(RFC3501_BODYSTRUCTURE).unwrap();

    assert_eq!(body.mime_type(), "multipart/mixed");
    assert_eq!(body.children().len(), 2);

    let first = body.find_section("1").unwrap();
    assert_eq!(first.mime_type(), "text/plain");
    assert_eq!(first.octets(), Some(1152));
    assert_eq!(first.lines(), Some(23));
    assert_eq!(first.parameter("charset"), Some(&b"US-ASCII"[..]));

    let second = body.find_section("2").unwrap();
    let fields = second.fields().unwrap();
    assert_eq!(fields.id, b"<960723163407.20117h@cac.washington.edu>");
    assert_eq!(fields.description, b"Compiler diff");
    assert_eq!(fields.encoding, b"BASE64");
    assert_eq!(second.parameter("name"), Some(&b"cc.diff"[..]));
}

#[test]
fn test_rfc3501_envelope_in_fetch_line() {
    let line = br#"* 12 FETCH (FLAGS (\Seen) INTERNALDATE "17-Jul-1996 02:44:25 -0700" RFC822.SIZE 4286 ENVELOPE ("Wed, 17 Jul 1996 02:23:25 -0700 (PDT)" "IMAP4rev1 WG mtg summary and minutes" (("Terry Gray" NIL "gray" "cac.washington.edu")) (("Terry Gray" NIL "gray" "cac.washington.edu")) (("Terry Gray" NIL "gray" "cac.washington.edu")) ((NIL NIL "imap" "cac.washington.edu")) ((NIL NIL "minutes" "CNRI.Reston.VA.US")("John Klensin" NIL "KLENSIN" "MIT.EDU")) NIL NIL "<B27397-0100000@cac.washington.edu>") BODY ("TEXT" "PLAIN" ("CHARSET" "US-ASCII") NIL NIL "7BIT" 3028 92))"#;

    let envelope = Decoder::new(line)
        .with_offset(offset_after(line, "ENVELOPE"))
        .read_envelope()
        .unwrap();

    assert_eq!(
        envelope.date.unwrap().to_rfc3339(),
        "1996-07-17T02:23:25-07:00"
    );
    assert_eq!(
        envelope.subject_lossy(),
        "IMAP4rev1 WG mtg summary and minutes"
    );
    assert_eq!(envelope.from[0].to_string(), "\"Terry Gray\" <gray@cac.washington.edu>");
    assert_eq!(envelope.to[0].email().unwrap(), "imap@cac.washington.edu");
    assert_eq!(
        envelope
            .cc
            .iter()
            .map(|a| a.email().unwrap())
            .collect::<Vec<_>>(),
        ["minutes@CNRI.Reston.VA.US", "KLENSIN@MIT.EDU"]
    );
    assert_eq!(
        envelope.message_id_lossy(),
        "<B27397-0100000@cac.washington.edu>"
    );

    let body = Decoder::new(line)
        .with_offset(offset_after(line, "BODY"))
        .read_body_structure()
        .unwrap();
    assert_eq!(body.lines(), Some(92));
}

#[test]
fn test_full_message_tree() {
    // Shape of the RFC 3501 section 6.4.5 example message, with extension
    // data as sent by Dovecot.
    let input = br#"(("TEXT" "PLAIN" ("CHARSET" "UTF-8") NIL NIL "7BIT" 30 2 NIL NIL NIL NIL)("APPLICATION" "OCTET-STREAM" ("NAME" "data.bin") NIL NIL "BASE64" 1024 NIL ("ATTACHMENT" ("FILENAME" "data.bin")) NIL NIL)("MESSAGE" "RFC822" NIL NIL NIL "7BIT" 600 ("Mon, 7 Feb 1994 21:52:25 -0800" "Fwd" (("Fred" NIL "fred" "example.org")) NIL NIL NIL NIL NIL NIL "<fwd@example.org>") (("TEXT" "PLAIN" ("CHARSET" "US-ASCII") NIL NIL "7BIT" 12 1 NIL NIL NIL NIL)("IMAGE" "GIF" ("NAME" "a.gif") NIL NIL "BASE64" 400 NIL NIL NIL NIL) "MIXED" ("BOUNDARY" "inner") NIL NIL NIL) 20 NIL NIL NIL NIL)(("TEXT" "PLAIN" ("CHARSET" "UTF-8") NIL NIL "QUOTED-PRINTABLE" 40 3 NIL NIL NIL NIL)("TEXT" "HTML" ("CHARSET" "UTF-8") NIL NIL "QUOTED-PRINTABLE" 90 4 NIL NIL NIL NIL) "ALTERNATIVE" ("BOUNDARY" "alt") NIL NIL NIL) "MIXED" ("BOUNDARY" "outer") NIL NIL NIL)"#;

    let body = parse_body_structure(input).unwrap();
    let sections: Vec<(String, String)> = body
        .walk()
        .into_iter()
        .map(|(path, part)| (section_name(&path), part.mime_type()))
        .collect();

    let expected = [
        ("", "multipart/mixed"),
        ("1", "text/plain"),
        ("2", "application/octet-stream"),
        ("3", "message/rfc822"),
        ("3.1", "text/plain"),
        ("3.2", "image/gif"),
        ("4", "multipart/alternative"),
        ("4.1", "text/plain"),
        ("4.2", "text/html"),
    ];
    assert_eq!(sections.len(), expected.len());
    for ((section, mime), (want_section, want_mime)) in sections.iter().zip(expected) {
        assert_eq!(section, want_section);
        assert_eq!(mime, want_mime);
    }

    assert_eq!(body.parameter("boundary"), Some(&b"outer"[..]));

    let attachment = body.find_section("2").unwrap();
    let disposition = attachment.disposition().unwrap();
    assert!(disposition.is_attachment());
    assert_eq!(
        disposition.parameters.get(&b"FILENAME".to_vec()).unwrap(),
        b"data.bin"
    );

    let forwarded = body.find_section("3").unwrap();
    let envelope = forwarded.envelope().unwrap();
    assert_eq!(envelope.subject, b"Fwd");
    assert_eq!(envelope.from[0].mailbox, b"fred");
    assert_eq!(forwarded.lines(), Some(20));
    assert_eq!(
        forwarded.embedded_body().unwrap().parameter("boundary"),
        Some(&b"inner"[..])
    );
}

#[test]
fn test_literal_filename() {
    let input = b"(\"APPLICATION\" \"PDF\" (\"NAME\" {11}\r\nq1 (2) .pdf) NIL NIL \"BASE64\" 10)";
    let body = parse_body_structure(input).unwrap();
    assert_eq!(body.parameter("name"), Some(&b"q1 (2) .pdf"[..]));
}

#[test]
fn test_raw_bytes_are_preserved() {
    let body = parse_body_structure(
        b"(\"TEXT\" \"PLAIN\" (\"NAME\" \"caf\xc3\xa9 \xff.txt\") NIL NIL \"8BIT\" 5 1)",
    )
    .unwrap();
    assert_eq!(body.parameter("name"), Some(&b"caf\xc3\xa9 \xff.txt"[..]));
}

#[test]
fn test_group_syntax_in_envelope() {
    let envelope = parse_envelope(
        br#"(NIL "Team" NIL NIL NIL ((NIL NIL "undisclosed-recipients" NIL)(NIL NIL NIL NIL)) NIL NIL NIL NIL)"#,
    )
    .unwrap();

    assert_eq!(envelope.to.len(), 2);
    assert!(envelope.to[0].is_group_start());
    assert!(envelope.to[1].is_group_end());
    assert!(envelope.to[0].host.is_none());
    assert!(envelope.date.is_none());
}

#[test]
fn test_unknown_extension_is_kept() {
    let body = parse_body_structure(
        br#"("TEXT" "PLAIN" NIL NIL NIL "7BIT" 1 1 NIL NIL NIL NIL ("X-FUTURE" 1) "tail")"#,
    )
    .unwrap();

    let Some(Extension::Multiple(values)) = body.extension() else {
        panic!("Expected multiple extension values");
    };
    assert_eq!(values.len(), 2);
    assert_eq!(values[1], Value::from("tail"));
}

#[test]
fn test_errors_report_kind_and_location() {
    let line = br#"* 7 FETCH (BODYSTRUCTURE ("TEXT" "PLAIN" NIL NIL NIL "7BIT" 10))"#;
    let offset = offset_after(line, "BODYSTRUCTURE");

    let err = Decoder::new(line)
        .with_offset(offset)
        .read_body_structure()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoData);
    assert_eq!(err.offset(), offset);
    assert!(err.to_string().contains(&format!("offset {offset}")));
}

#[test]
fn test_truncated_line_is_a_parse_error() {
    let line = br#"* 7 FETCH (BODYSTRUCTURE ("TEXT" "PLAIN" NIL"#;
    let err = Decoder::new(line)
        .with_offset(offset_after(line, "BODYSTRUCTURE"))
        .read_body_structure()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_depth_limit_from_options() {
    let mut input = String::new();
    for _ in 0..10 {
        input.push_str(
            "(\"MESSAGE\" \"RFC822\" NIL NIL NIL \"7BIT\" 1 (NIL NIL NIL NIL NIL NIL NIL NIL NIL NIL) ",
        );
    }
    input.push_str("(\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 1 1)");
    for _ in 0..10 {
        input.push_str(" 1)");
    }

    let line = input.as_bytes();
    let shallow = DecodeOptions::builder().max_depth(5).build();
    let err = Decoder::new(line)
        .with_options(shallow)
        .read_body_structure()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);

    let body = Decoder::new(line).read_body_structure().unwrap();
    let mut part = &body;
    let mut depth = 0;
    while let MessagePart::Message { body, .. } = part {
        part = &**body;
        depth += 1;
    }
    assert_eq!(depth, 10);
    assert_eq!(part.mime_type(), "text/plain");
}

#[test]
fn test_decoder_is_shareable_across_threads() {
    let decoder = Decoder::new(RFC3501_BODYSTRUCTURE);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| decoder.read_body_structure().unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().children().len(), 2);
        }
    });
}

#[test]
fn test_hostile_nesting_is_an_error() {
    let mut input = vec![b'('; 100_000];
    input.extend_from_slice(b"\"text\"");

    assert_eq!(
        parse_body_structure(&input).unwrap_err().kind(),
        ErrorKind::Parse
    );
    assert_eq!(parse_envelope(&input).unwrap_err().kind(), ErrorKind::Parse);
    assert_eq!(
        Decoder::new(&input).read_envelope().unwrap_err().kind(),
        ErrorKind::Parse
    );
}
