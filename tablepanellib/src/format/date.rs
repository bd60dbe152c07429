//! Timestamp parsing and moment-style date patterns.
//!
//! Dashboards store date formats as moment patterns (`YYYY-MM-DD HH:mm:ss`).
//! Each token is translated to its `chrono` strftime equivalent and text in
//! `[brackets]` is copied through literally.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::data::value::CellValue;

/// Rendered for values that do not describe a point in time.
pub const INVALID_DATE: &str = "Invalid date";

/// Moment tokens, longest first so `YYYY` wins over `YY`.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("SSS", "%3f"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
    ("ZZ", "%z"),
    ("Z", "%:z"),
    ("X", "%s"),
];

/// Parse a cell into an instant.
///
/// Numbers are epoch milliseconds. Strings are RFC 3339, or a local date or
/// date-time without an offset.
pub fn parse_timestamp(value: &CellValue) -> Option<DateTime<Utc>> {
    match value {
        CellValue::Number(ms) if ms.is_finite() => Utc.timestamp_millis_opt(*ms as i64).single(),
        CellValue::String(s) => parse_date_string(s.trim()),
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Translate a moment pattern into a strftime pattern.
///
/// `x` (epoch milliseconds) has no strftime form and is returned as a
/// separate marker so [`format_moment`] can substitute it.
fn translate(pattern: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut rest = pattern;

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped.find(']').unwrap_or(stripped.len());
            pieces.push(Piece::Literal(stripped[..end].to_string()));
            rest = stripped.get(end + 1..).unwrap_or("");
            continue;
        }
        if let Some(stripped) = rest.strip_prefix('x') {
            pieces.push(Piece::EpochMillis);
            rest = stripped;
            continue;
        }
        if let Some((token, spec)) = TOKENS.iter().find(|(token, _)| rest.starts_with(token)) {
            pieces.push(Piece::Spec(spec));
            rest = &rest[token.len()..];
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            pieces.push(Piece::Literal(c.to_string()));
        }
        rest = chars.as_str();
    }

    pieces
}

enum Piece {
    Spec(&'static str),
    Literal(String),
    EpochMillis,
}

/// Format `dt` with a moment pattern.
pub fn format_moment<Tz>(dt: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    translate(pattern)
        .into_iter()
        .map(|piece| match piece {
            Piece::Spec(spec) => dt.format(spec).to_string(),
            Piece::Literal(text) => text,
            Piece::EpochMillis => dt.timestamp_millis().to_string(),
        })
        .collect()
}

/// Format a cell as a date, in UTC or the local time zone.
pub fn format_date(value: &CellValue, pattern: &str, utc: bool) -> String {
    match parse_timestamp(value) {
        Some(dt) if utc => format_moment(&dt, pattern),
        Some(dt) => format_moment(&dt.with_timezone(&Local), pattern),
        None => INVALID_DATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2019-03-04 05:06:07.089 UTC
    const TS: f64 = 1_551_675_967_089.0;

    #[test]
    fn test_default_pattern_utc() {
        assert_eq!(
            format_date(&CellValue::Number(TS), "YYYY-MM-DD HH:mm:ss", true),
            "2019-03-04 05:06:07"
        );
    }

    #[test]
    fn test_short_tokens_and_names() {
        let value = CellValue::Number(TS);
        assert_eq!(format_date(&value, "D/M/YY h:m:s a", true), "4/3/19 5:6:7 am");
        assert_eq!(format_date(&value, "ddd, MMM D", true), "Mon, Mar 4");
        assert_eq!(format_date(&value, "dddd MMMM", true), "Monday March");
        assert_eq!(format_date(&value, "HH:mm:ss.SSS", true), "05:06:07.089");
    }

    #[test]
    fn test_literals_and_epoch_tokens() {
        let value = CellValue::Number(TS);
        assert_eq!(format_date(&value, "[Day] DD", true), "Day 04");
        assert_eq!(format_date(&value, "X", true), "1551675967");
        assert_eq!(format_date(&value, "x", true), "1551675967089");
        assert_eq!(format_date(&value, "Z", true), "+00:00");
    }

    #[test]
    fn test_rfc3339_string() {
        let value = CellValue::from("2019-03-04T07:06:07+02:00");
        assert_eq!(
            format_date(&value, "YYYY-MM-DD HH:mm", true),
            "2019-03-04 05:06"
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            format_date(&CellValue::from("not a date"), "YYYY", true),
            INVALID_DATE
        );
        assert_eq!(format_date(&CellValue::Bool(true), "YYYY", true), INVALID_DATE);
        assert_eq!(
            format_date(&CellValue::Number(f64::NAN), "YYYY", true),
            INVALID_DATE
        );
    }
}
