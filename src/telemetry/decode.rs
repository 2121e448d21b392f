use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;

use super::grammar::Frame;
use super::DecodeError;

/// Number of leading digits holding the `YYYYMMDDHHMMSS` timestamp.
pub const TIMESTAMP_DIGITS: usize = 14;

/// Stored in place of an absent message.
pub const NO_MESSAGE: &str = "Nessuno";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Reading(DecodedReading),
    Fault(DecodedFault),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedReading {
    pub recorded_at: DateTime<Tz>,
    pub value: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFault {
    pub message: String,
}

/// Classify a frame against the sensor's fault code.
///
/// The comparison is textual: `"0999"` and `"999"` are different codes.
/// Anything that is not the fault code must be a reading, whose first
/// [`TIMESTAMP_DIGITS`] digits are a local timestamp in `tz` and whose
/// remaining digits are the integer value.
///
/// # Errors
///
/// Returns [`DecodeError`] when a reading's digit run is too short, its
/// timestamp is not a valid date, or its value is missing or overflows.
pub fn classify(frame: &Frame<'_>, fault_code: &str, tz: Tz) -> Result<Decoded, DecodeError> {
    let message = frame.message.unwrap_or(NO_MESSAGE).to_string();

    if frame.digits == fault_code {
        return Ok(Decoded::Fault(DecodedFault { message }));
    }

    if frame.digits.len() < TIMESTAMP_DIGITS {
        return Err(DecodeError::TimestampTooShort(frame.digits.len()));
    }
    // Digits are ASCII, so byte offsets are char offsets
    let (stamp, value) = frame.digits.split_at(TIMESTAMP_DIGITS);

    let recorded_at = parse_timestamp(stamp, tz)?;
    let value = value
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidValue(value.to_string()))?;

    Ok(Decoded::Reading(DecodedReading {
        recorded_at,
        value,
        message,
    }))
}

/// Parse `YYYYMMDDHHMMSS` as a wall-clock time in `tz`.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidTimestamp`] for out-of-range fields and
/// [`DecodeError::NonexistentLocalTime`] for times skipped by a DST change.
pub fn parse_timestamp(stamp: &str, tz: Tz) -> Result<DateTime<Tz>, DecodeError> {
    let invalid = || DecodeError::InvalidTimestamp(stamp.to_string());

    if stamp.len() != TIMESTAMP_DIGITS || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let field = |range: std::ops::Range<usize>| -> Result<u32, DecodeError> {
        stamp[range].parse::<u32>().map_err(|_| invalid())
    };

    let year = i32::try_from(field(0..4)?).map_err(|_| invalid())?;
    let naive = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)
        .and_then(|date| date.and_hms_opt(field(8..10).ok()?, field(10..12).ok()?, field(12..14).ok()?))
        .ok_or_else(invalid)?;

    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| DecodeError::NonexistentLocalTime(stamp.to_string()))
}
