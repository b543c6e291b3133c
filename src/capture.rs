//! Capture folders and their naming convention
//!
//! A capture is one recording session written by the logger as a folder named
//! `<label>@<timestamp>`, where the timestamp is `YYYYMMDD_HHMMSS` followed by
//! fractional-second digits (e.g. `front_cam@20240101_093015123456`).

use crate::{DataSyncError, Result};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the label and the timestamp of a capture name
pub const CAPTURE_SEPARATOR: char = '@';

/// Whole-second part of the timestamp
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_SECONDS_LEN: usize = 15;
const MAX_FRACTION_DIGITS: usize = 9;

/// Whether a folder name follows the capture convention at all
pub fn is_capture_name(name: &str) -> bool {
    name.contains(CAPTURE_SEPARATOR)
}

/// Timestamp segment of a capture name: the text after the first `@`, up to
/// the next `@` if there is one.
pub fn timestamp_segment(name: &str) -> Option<&str> {
    name.split(CAPTURE_SEPARATOR).nth(1)
}

/// Parse a capture timestamp segment.
///
/// Fractional digits are read as a decimal fraction of a second, so six
/// digits are microseconds and three are milliseconds.
pub fn parse_timestamp(segment: &str) -> std::result::Result<NaiveDateTime, String> {
    if segment.len() < TIMESTAMP_SECONDS_LEN || !segment.is_char_boundary(TIMESTAMP_SECONDS_LEN) {
        return Err(format!(
            "timestamp '{}' is shorter than YYYYMMDD_HHMMSS",
            segment
        ));
    }

    let (seconds, fraction) = segment.split_at(TIMESTAMP_SECONDS_LEN);
    let base = NaiveDateTime::parse_from_str(seconds, TIMESTAMP_FORMAT)
        .map_err(|e| format!("timestamp '{}': {}", segment, e))?;

    if fraction.is_empty() {
        return Ok(base);
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!(
            "timestamp '{}' has non-digit fractional part '{}'",
            segment, fraction
        ));
    }
    if fraction.len() > MAX_FRACTION_DIGITS {
        return Err(format!(
            "timestamp '{}' has more than {} fractional digits",
            segment, MAX_FRACTION_DIGITS
        ));
    }

    // Right-pad to nanoseconds: "123" -> 123_000_000
    let nanos: i64 = format!("{:0<9}", fraction)
        .parse()
        .map_err(|e| format!("timestamp '{}': {}", segment, e))?;

    Ok(base + Duration::nanoseconds(nanos))
}

/// A capture folder identified by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Folder name, `<label>@<timestamp>`
    pub name: String,

    /// Recording start parsed from the name
    pub created_at: NaiveDateTime,
}

impl Capture {
    /// Parse a capture from its folder name
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        let segment = timestamp_segment(&name).ok_or_else(|| DataSyncError::InvalidCaptureName {
            name: name.clone(),
            reason: format!("missing '{}' separator", CAPTURE_SEPARATOR),
        })?;

        let created_at =
            parse_timestamp(segment).map_err(|reason| DataSyncError::InvalidCaptureName {
                name: name.clone(),
                reason,
            })?;

        Ok(Self { name, created_at })
    }

    /// How long ago the capture started, relative to `now`
    pub fn age_at(&self, now: NaiveDateTime) -> Duration {
        now - self.created_at
    }
}

impl fmt::Display for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Where a capture stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Still inside the completion threshold; may be written to
    Incomplete,
    /// Finished, no critical marker
    CompletedNormal,
    /// Finished and tagged with the critical marker
    CompletedCritical,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Incomplete => write!(f, "incomplete"),
            Disposition::CompletedNormal => write!(f, "completed_normal"),
            Disposition::CompletedCritical => write!(f, "completed_critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_is_capture_name() {
        assert!(is_capture_name("cam@20240101_000000000000"));
        assert!(!is_capture_name("criticalData"));
        assert!(!is_capture_name("notes.txt"));
    }

    #[test]
    fn test_timestamp_segment() {
        assert_eq!(timestamp_segment("a@20240101_000000"), Some("20240101_000000"));
        assert_eq!(timestamp_segment("a@20240101_000000@extra"), Some("20240101_000000"));
        assert_eq!(timestamp_segment("no-separator"), None);
    }

    #[test]
    fn test_parse_timestamp_microseconds() {
        let ts = parse_timestamp("20240315_142530123456").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (14, 25, 30));
        assert_eq!(ts.nanosecond(), 123_456_000);
    }

    #[test]
    fn test_parse_timestamp_short_fraction() {
        let ts = parse_timestamp("20240315_1425305").unwrap();
        assert_eq!(ts.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_parse_timestamp_without_fraction() {
        assert_eq!(
            parse_timestamp("20240101_000000").unwrap(),
            at(2024, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("garbage").is_err());
        assert!(parse_timestamp("20241301_000000").is_err());
        assert!(parse_timestamp("20240101_000000abc").is_err());
        assert!(parse_timestamp("20240101_0000001234567890").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_capture_parse() {
        let capture = Capture::parse("front@20240101_000000000000").unwrap();
        assert_eq!(capture.created_at, at(2024, 1, 1, 0, 0, 0));
        assert_eq!(capture.to_string(), "front@20240101_000000000000");
    }

    #[test]
    fn test_capture_parse_errors() {
        let err = Capture::parse("criticalData").unwrap_err();
        assert!(matches!(err, DataSyncError::InvalidCaptureName { .. }));

        let err = Capture::parse("cam@yesterday").unwrap_err();
        assert!(err.to_string().contains("cam@yesterday"));
    }

    #[test]
    fn test_capture_age() {
        let capture = Capture::parse("cam@20240101_000000").unwrap();
        let age = capture.age_at(at(2024, 1, 1, 0, 10, 0));
        assert_eq!(age, Duration::minutes(10));
    }

    #[test]
    fn test_disposition_display() {
        assert_eq!(Disposition::Incomplete.to_string(), "incomplete");
        assert_eq!(Disposition::CompletedNormal.to_string(), "completed_normal");
        assert_eq!(Disposition::CompletedCritical.to_string(), "completed_critical");
    }
}
