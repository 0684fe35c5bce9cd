//! Input Line Parsing
//!
//! One sample per line, semicolon-separated:
//!
//! ```text
//! 10-03-2016 15:19:20.729915 ;   68998
//! ```
//!
//! The first field is a `dd-mm-yyyy hh:mm:ss.usec` timestamp, the second
//! the measured value; anything after a further `;` is ignored. Fields
//! are whitespace-trimmed and the value parse tolerates trailing junk
//! the way `strtod` does, so `"68998 au"` still reads as 68998.
//!
//! Lines without a `;` or with an unparsable timestamp or value are
//! reported as `None`; the pipeline driver silently skips them.

use chrono::NaiveDateTime;

use crate::types::{MicroTime, RawSample};

const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S%.f";

/// Parse a `dd-mm-yyyy hh:mm:ss.usec` timestamp.
///
/// The naive timestamp is taken as UTC; downstream only microsecond
/// differences are consumed, so the absolute offset is irrelevant.
pub fn parse_timestamp(text: &str) -> Option<MicroTime> {
    let dt = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).ok()?;
    let utc = dt.and_utc();
    Some(MicroTime::from_parts(
        utc.timestamp(),
        i64::from(utc.timestamp_subsec_micros()),
    ))
}

/// Parse the longest numeric prefix of `text` as an `f64`.
fn parse_leading_f64(text: &str) -> Option<f64> {
    if let Ok(v) = text.parse() {
        return Some(v);
    }
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(text.len());
    let mut prefix = &text[..end];
    while !prefix.is_empty() {
        if let Ok(v) = prefix.parse() {
            return Some(v);
        }
        prefix = &prefix[..prefix.len() - 1];
    }
    None
}

/// Parse one input line into a sample, or `None` when the line is not
/// a sample (missing separator, bad timestamp, bad value).
pub fn parse_line(line: &str) -> Option<RawSample> {
    let (timestamp_part, rest) = line.split_once(';')?;
    let time_text = timestamp_part.trim();
    let time = parse_timestamp(time_text)?;
    let value = parse_leading_f64(rest.trim())?;
    Some(RawSample {
        time,
        time_text: time_text.to_string(),
        value,
    })
}
