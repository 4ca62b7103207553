//! Text-to-value coercion for the per-type parsers.
//!
//! Every function here is total: input it cannot interpret comes back as
//! [`OpenEdgeValueData::Text`] holding the raw string.

use crate::openedge::OpenEdgeValueData;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// `NaN`, `Infinity` and `-Infinity` become IEEE specials; anything else is
/// left for the caller to convert.
pub fn parse_floating(raw: &str) -> OpenEdgeValueData {
    match raw {
        "NaN" => OpenEdgeValueData::Double(f64::NAN),
        "Infinity" => OpenEdgeValueData::Double(f64::INFINITY),
        "-Infinity" => OpenEdgeValueData::Double(f64::NEG_INFINITY),
        _ => OpenEdgeValueData::Text(raw.to_owned()),
    }
}

/// Parse a timestamp into an absolute instant.
///
/// A value carrying its own offset is taken as is. A value without one was
/// written in the session's zone and is read in `timezone`.
pub fn parse_timestamp(raw: &str, timezone: FixedOffset) -> OpenEdgeValueData {
    match timestamp(raw.trim(), timezone) {
        Some(instant) => OpenEdgeValueData::Timestamp(instant),
        None => OpenEdgeValueData::Text(raw.to_owned()),
    }
}

fn timestamp(raw: &str, timezone: FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    timezone
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Date-only values are never shifted between zones.
pub fn parse_date_only(raw: &str) -> OpenEdgeValueData {
    OpenEdgeValueData::Text(raw.to_owned())
}

pub fn parse_decimal(raw: &str) -> OpenEdgeValueData {
    let trimmed = raw.trim();
    Decimal::from_str_exact(trimmed)
        .or_else(|_| trimmed.parse::<Decimal>())
        .map(OpenEdgeValueData::Decimal)
        .unwrap_or_else(|_| OpenEdgeValueData::Text(raw.to_owned()))
}

pub fn parse_boolean(raw: &str) -> OpenEdgeValueData {
    match raw {
        "t" | "true" | "TRUE" | "1" | "y" | "yes" | "on" => OpenEdgeValueData::Bool(true),
        "f" | "false" | "FALSE" | "0" | "n" | "no" | "off" => OpenEdgeValueData::Bool(false),
        _ => OpenEdgeValueData::Text(raw.to_owned()),
    }
}

/// Parse an hstore literal such as `"a"=>"1", "b"=>NULL`.
pub fn parse_hstore(raw: &str) -> OpenEdgeValueData {
    match hstore(raw) {
        Some(map) => OpenEdgeValueData::HStore(map),
        None => OpenEdgeValueData::Text(raw.to_owned()),
    }
}

fn hstore(raw: &str) -> Option<BTreeMap<String, Option<String>>> {
    let mut map = BTreeMap::new();
    let mut chars = raw.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        if chars.peek().is_none() {
            return Some(map);
        }

        let key = hstore_quoted(&mut chars)?;

        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        if chars.next()? != '=' || chars.next()? != '>' {
            return None;
        }
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }

        let value = if chars.peek() == Some(&'"') {
            Some(hstore_quoted(&mut chars)?)
        } else {
            let word: String = chars.by_ref().take(4).collect();
            if !word.eq_ignore_ascii_case("NULL") {
                return None;
            }
            None
        };

        map.insert(key, value);
    }
}

fn hstore_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    if chars.next()? != '"' {
        return None;
    }
    let mut out = String::new();
    loop {
        match chars.next()? {
            '\\' => out.push(chars.next()?),
            '"' => return Some(out),
            c => out.push(c),
        }
    }
}
