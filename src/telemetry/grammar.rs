//! Tokenizer for raw telemetry strings.
//!
//! ```text
//! raw     = sensor SP body
//! sensor  = 1*( any char except SP )
//! body    = prefix digits [ ")" ] message
//! prefix  = *( any char except DIGIT )
//! digits  = 1*DIGIT                ; ASCII 0-9
//! message = *( any char )
//! ```
//!
//! Leading and trailing whitespace around the whole string is ignored, and
//! only the first space separates the sensor id from the body, so messages
//! may contain spaces. An empty message is reported as `None`.

use super::DecodeError;

/// A tokenized raw string, borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub sensor_id: &'a str,
    /// Text before the digit run, e.g. `"E("`. Not used for classification.
    pub prefix: &'a str,
    pub digits: &'a str,
    pub message: Option<&'a str>,
}

/// Split a raw string into its parts.
///
/// # Errors
///
/// Returns [`DecodeError`] when the string is blank, has no space after the
/// sensor id, or the body contains no digit run.
pub fn tokenize(raw: &str) -> Result<Frame<'_>, DecodeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DecodeError::Empty);
    }

    let (sensor_id, body) = raw.split_once(' ').ok_or(DecodeError::MissingSeparator)?;

    let digits_start = body
        .find(|c: char| c.is_ascii_digit())
        .ok_or(DecodeError::MissingDigits)?;
    let (prefix, rest) = body.split_at(digits_start);

    let digits_len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, tail) = rest.split_at(digits_len);

    let message = tail.strip_prefix(')').unwrap_or(tail);

    Ok(Frame {
        sensor_id,
        prefix,
        digits,
        message: (!message.is_empty()).then_some(message),
    })
}
