//! Decodes a `BODYSTRUCTURE` or `ENVELOPE` list read from stdin.
//!
//! Run with:
//!
//! ```sh
//! echo '("TEXT" "PLAIN" NIL NIL NIL "7BIT" 12 1)' | cargo run --example inspect
//! echo '(NIL "Hi" NIL NIL NIL NIL NIL NIL NIL NIL)' | cargo run --example inspect -- envelope
//! ```
//!
//! A whole `FETCH` line may be given as well; the list following the
//! `BODYSTRUCTURE`, `BODY` or `ENVELOPE` item is decoded.

use std::io::Read;

use anyhow::{Context, bail};
use imap_structure::{Decoder, MessagePart, section_name};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imap_structure=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let envelope_mode = match std::env::args().nth(1).as_deref() {
        None | Some("body") => false,
        Some("envelope") => true,
        Some(other) => bail!("unknown mode {other:?}, expected `body` or `envelope`"),
    };

    let mut line = Vec::new();
    std::io::stdin()
        .read_to_end(&mut line)
        .context("reading stdin")?;
    let items: &[&[u8]] = if envelope_mode {
        &[b"ENVELOPE ".as_slice()]
    } else {
        &[b"BODYSTRUCTURE ".as_slice(), b"BODY ".as_slice()]
    };
    let offset = find_item(&line, items).unwrap_or(0);
    info!(len = line.len(), offset, "Decoding input");

    let decoder = Decoder::new(&line).with_offset(offset);
    if envelope_mode {
        let envelope = decoder.read_envelope()?;
        print!("{envelope}");
    } else {
        let body = decoder.read_body_structure()?;
        for (path, part) in body.walk() {
            println!("{}", describe(&path, part));
        }
    }
    Ok(())
}

/// Returns the offset just past the first of `items` found in `line`.
fn find_item(line: &[u8], items: &[&[u8]]) -> Option<usize> {
    items.iter().find_map(|item| {
        line.windows(item.len())
            .position(|w| w.eq_ignore_ascii_case(item))
            .map(|pos| pos + item.len())
    })
}

fn describe(path: &[u32], part: &MessagePart) -> String {
    let indent = "  ".repeat(path.len());
    let section = if path.is_empty() {
        "TEXT".to_string()
    } else {
        section_name(path)
    };
    let mut out = format!("{indent}{section} {}", part.mime_type());
    if let Some(octets) = part.octets() {
        out.push_str(&format!(" {octets} octets"));
    }
    if let Some(lines) = part.lines() {
        out.push_str(&format!(" {lines} lines"));
    }
    if let Some(name) = part.parameter("name") {
        out.push_str(&format!(" name={:?}", String::from_utf8_lossy(name)));
    }
    if let Some(disposition) = part.disposition() {
        out.push_str(&format!(" [{}]", String::from_utf8_lossy(&disposition.kind)));
    }
    if let Some(envelope) = part.envelope() {
        out.push_str(&format!(" subject={:?}", envelope.subject_lossy()));
    }
    out
}
