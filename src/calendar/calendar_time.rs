//! Date/time decoding for event start properties.

use crate::calendar::calendar_types::EventStart;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized date/time encoding: '{0}'")]
pub struct TimeDecodeError(pub String);

type Decoder = fn(&str, &str) -> Option<EventStart>;

/// Encodings tried in order; the first match wins.
const ENCODINGS: &[(&str, Decoder)] = &[
    ("%Y%m%dT%H%M%S", decode_timed),
    ("%Y%m%d", decode_all_day),
];

fn decode_timed(raw: &str, format: &str) -> Option<EventStart> {
    NaiveDateTime::parse_from_str(raw, format).ok().map(EventStart::Timed)
}

fn decode_all_day(raw: &str, format: &str) -> Option<EventStart> {
    NaiveDate::parse_from_str(raw, format).ok().map(EventStart::AllDay)
}

/// Decode an ICS date or date-time value.
///
/// A trailing `Z` is dropped without any timezone conversion; the clock value
/// is only used for ordering and display.
pub fn decode(raw: &str) -> Result<EventStart, TimeDecodeError> {
    let trimmed = raw.trim();
    let value = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    ENCODINGS
        .iter()
        .find_map(|(format, decoder)| decoder(value, format))
        .ok_or_else(|| TimeDecodeError(raw.to_string()))
}
