//! Tolerant parsing of HL7 v2 DTM/TS and DT values.
//!
//! Timestamps are fixed-width numeric strings, `YYYY[MM[DD[HH[MM[SS[.S[S[S[S]]]]]]]]][+/-ZZZZ]`.
//! Parsing strips the timezone offset, fills a missing month or day with `01`,
//! right-pads missing time digits with zeros and keeps fractional seconds.
//!
//! Both functions fail soft: a malformed value is logged and reported as `None`
//! so that one bad field never discards a whole message.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";

/// Split a timestamp into its digits and optional fraction, validating any offset.
fn split_timestamp(raw: &str) -> Option<(&str, Option<&str>)> {
    let (value, offset) = match raw.find(['+', '-']) {
        Some(at) => (&raw[..at], Some(&raw[at + 1..])),
        None => (raw, None),
    };
    if let Some(offset) = offset {
        if offset.len() != 4 || !offset.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    let (digits, fraction) = match value.split_once('.') {
        Some((digits, fraction)) => (digits, Some(fraction)),
        None => (value, None),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((digits, fraction))
}

/// Widen a 4- or 6-digit date prefix to 8 digits.
fn complete_date(digits: &str) -> Option<String> {
    match digits.len() {
        4 => Some(format!("{digits}0101")),
        6 => Some(format!("{digits}01")),
        n if n >= 8 => Some(digits.to_string()),
        _ => None,
    }
}

/// Parse an HL7 timestamp into a local (offset-free) date-time.
///
/// # Returns
///
/// `None` for empty input, and for anything that is not a valid timestamp (logged at warn).
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = (|| {
        let (digits, fraction) = split_timestamp(raw)?;
        if !matches!(digits.len(), 4 | 6 | 8 | 10 | 12 | 14) {
            return None;
        }

        let mut padded = complete_date(digits)?;
        while padded.len() < 14 {
            padded.push('0');
        }
        let datetime = NaiveDateTime::parse_from_str(&padded, DATETIME_FORMAT).ok()?;

        match fraction {
            None => Some(datetime),
            Some(fraction) => {
                if fraction.is_empty()
                    || fraction.len() > 9
                    || !fraction.chars().all(|c| c.is_ascii_digit())
                {
                    return None;
                }
                let nanos: u32 = format!("{fraction:0<9}").parse().ok()?;
                datetime.with_nanosecond(nanos)
            }
        }
    })();

    if parsed.is_none() {
        tracing::warn!(value = %raw, "failed to parse HL7 datetime");
    }
    parsed
}

/// Parse an HL7 date (`YYYY`, `YYYYMM` or `YYYYMMDD`, extra time digits ignored).
///
/// # Returns
///
/// `None` for empty input, and for anything that is not a valid date (logged at warn).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = (|| {
        let (digits, _) = split_timestamp(raw)?;
        let date_digits = if digits.len() >= 8 { &digits[..8] } else { digits };
        let complete = complete_date(date_digits)?;
        NaiveDate::parse_from_str(&complete, DATE_FORMAT).ok()
    })();

    if parsed.is_none() {
        tracing::warn!(value = %raw, "failed to parse HL7 date");
    }
    parsed
}
