//! RFC 2822 date-time parsing for envelope dates.
//!
//! Servers copy the `Date:` header into the envelope verbatim, so anything a
//! mail client ever produced shows up here. Strict RFC 2822 is tried first;
//! the obsolete forms of RFC 2822 section 4.3 are normalised and retried.

use chrono::{DateTime, FixedOffset};

/// Parses an RFC 2822 date-time.
///
/// Returns `None` if the input is empty or not recognisable as a date.
#[must_use]
pub fn parse_rfc2822(input: &[u8]) -> Option<DateTime<FixedOffset>> {
    let text = String::from_utf8_lossy(input);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(text)
        .ok()
        .or_else(|| parse_obsolete(text))
}

/// Obsolete formats: two-digit years, legacy zone names, missing seconds,
/// trailing comments.
fn parse_obsolete(text: &str) -> Option<DateTime<FixedOffset>> {
    let mut tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();

    // Day of week is optional and carries no information.
    if tokens.first().is_some_and(|t| t.ends_with(',')) {
        tokens.remove(0);
    }
    while tokens.last().is_some_and(|t| t.starts_with('(') || t.ends_with(')')) {
        tokens.pop();
    }
    if tokens.len() != 5 {
        return None;
    }

    if let Some(year) = expand_two_digit_year(&tokens[2]) {
        tokens[2] = year;
    }
    if let Some(zone) = obsolete_zone_offset(&tokens[4]) {
        tokens[4] = zone.to_string();
    }

    let normalised = tokens.join(" ");
    DateTime::parse_from_str(&normalised, "%d %b %Y %H:%M:%S %z")
        .or_else(|_| DateTime::parse_from_str(&normalised, "%d %b %Y %H:%M %z"))
        .ok()
}

/// 00-49 map to 2000-2049, 50-99 to 1950-1999.
fn expand_two_digit_year(year: &str) -> Option<String> {
    if year.len() != 2 {
        return None;
    }
    let yy: u32 = year.parse().ok()?;
    let full = if yy < 50 { 2000 + yy } else { 1900 + yy };
    Some(full.to_string())
}

fn obsolete_zone_offset(zone: &str) -> Option<&'static str> {
    let offset = match zone.to_ascii_uppercase().as_str() {
        "UT" | "UTC" | "GMT" | "Z" => "+0000",
        "EST" => "-0500",
        "EDT" => "-0400",
        "CST" => "-0600",
        "CDT" => "-0500",
        "MST" => "-0700",
        "MDT" => "-0600",
        "PST" => "-0800",
        "PDT" => "-0700",
        _ => return None,
    };
    Some(offset)
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
    fn test_rfc2822() {
        let date = parse_rfc2822(b"Mon, 7 Feb 1994 21:52:25 -0800").unwrap();
        assert_eq!(date.to_rfc3339(), "1994-02-07T21:52:25-08:00");
    }

    #[test]
    fn test_comment_suffix() {
        let date = parse_rfc2822(b"Tue, 1 Jul 2003 10:52:37 +0200 (CEST)").unwrap();
        assert_eq!(date.to_rfc3339(), "2003-07-01T10:52:37+02:00");
    }

    #[test]
    fn test_without_weekday_and_seconds() {
        let date = parse_rfc2822(b"7 Feb 1994 21:52 -0800").unwrap();
        assert_eq!(date.to_rfc3339(), "1994-02-07T21:52:00-08:00");
    }

    #[test]
    fn test_two_digit_year_and_zone_name() {
        let date = parse_rfc2822(b"Fri, 21 Nov 97 09:55:06 GMT").unwrap();
        assert_eq!(date.to_rfc3339(), "1997-11-21T09:55:06+00:00");
    }

    #[test]
    fn test_invalid() {
        assert!(parse_rfc2822(b"").is_none());
        assert!(parse_rfc2822(b"   ").is_none());
        assert!(parse_rfc2822(b"not a date").is_none());
        assert!(parse_rfc2822(b"32 Foo 2003 25:61:00 +0200").is_none());
    }

    #[test]
    fn test_expand_two_digit_year() {
        assert_eq!(expand_two_digit_year("49").as_deref(), Some("2049"));
        assert_eq!(expand_two_digit_year("50").as_deref(), Some("1950"));
        assert_eq!(expand_two_digit_year("1997"), None);
    }
}
