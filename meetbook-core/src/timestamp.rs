//! Wire format for meeting timestamps.
//!
//! The API expects local wall-clock time with second precision and no UTC
//! offset (`2024-03-01T09:00:00`). Anything else is rejected by the server,
//! so every outgoing timestamp goes through [`format_local`].
//!
//! Incoming timestamps are parsed more leniently: fractional seconds are
//! dropped and RFC 3339 values are converted to local time.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{MeetbookError, MeetbookResult};

/// Outgoing timestamp format.
pub const LOCAL_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Calendar date format used by range queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_local(dt: &NaiveDateTime) -> String {
    dt.format(LOCAL_SECONDS_FORMAT).to_string()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a timestamp as sent by the server.
pub fn parse_server(s: &str) -> MeetbookResult<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(truncate_seconds(dt));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(truncate_seconds(dt.with_timezone(&Local).naive_local()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        // Midnight always exists on a NaiveDate
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default());
    }

    Err(MeetbookError::InvalidTimestamp(s.to_string()))
}

fn truncate_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// `#[serde(with = "local_seconds")]` for `NaiveDateTime` fields.
pub mod local_seconds {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_local(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_server(&s).map_err(serde::de::Error::custom)
    }
}

/// Same as [`local_seconds`] for optional fields.
pub mod option_local_seconds {
    use super::*;

    pub fn serialize<S: Serializer>(
        dt: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_str(&format_local(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        match s {
            Some(s) if !s.trim().is_empty() => {
                parse_server(&s).map(Some).map_err(serde::de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn formats_without_offset_or_fraction() {
        let t = dt(2024, 3, 1, 9, 0, 0).with_nanosecond(123_000_000).unwrap();
        assert_eq!(format_local(&t), "2024-03-01T09:00:00");
    }

    #[test]
    fn parses_plain_local_timestamp() {
        assert_eq!(parse_server("2024-03-01T09:30:00").unwrap(), dt(2024, 3, 1, 9, 30, 0));
    }

    #[test]
    fn parses_fractional_seconds() {
        assert_eq!(
            parse_server("2024-03-01T09:30:05.250").unwrap(),
            dt(2024, 3, 1, 9, 30, 5)
        );
    }

    #[test]
    fn parses_minutes_only() {
        assert_eq!(parse_server("2024-03-01T09:30").unwrap(), dt(2024, 3, 1, 9, 30, 0));
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        assert_eq!(parse_server("2024-03-01").unwrap(), dt(2024, 3, 1, 0, 0, 0));
    }

    #[test]
    fn rfc3339_is_converted_to_local() {
        let parsed = parse_server("2024-03-01T09:30:00Z").unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_server("next tuesday"),
            Err(MeetbookError::InvalidTimestamp(_))
        ));
    }
}
