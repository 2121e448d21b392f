//! Telemetry decoding pipeline.
//!
//! A raw status string travels through three stages:
//!
//! 1. [`grammar::tokenize`] splits it into sensor id, digit run and message
//!    without touching the database.
//! 2. [`decode::classify`] compares the digit run with the sensor's fault code
//!    and produces either a reading or a fault.
//! 3. [`ingest::ingest`] stores the raw string and its decoded row in a single
//!    transaction.

pub mod decode;
pub mod grammar;
pub mod history;
pub mod ingest;

pub use decode::{classify, Decoded, DecodedFault, DecodedReading, NO_MESSAGE, TIMESTAMP_DIGITS};
pub use grammar::{tokenize, Frame};
pub use ingest::{ingest, ingest_batch, BatchReport, Ingested, Outcome, RejectedLine};

/// Reasons a raw string cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,

    #[error("missing space between sensor id and body")]
    MissingSeparator,

    #[error("body contains no digits")]
    MissingDigits,

    #[error("expected at least 14 digits for the timestamp, got {0}")]
    TimestampTooShort(usize),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("timestamp '{0}' does not exist in the telemetry timezone")]
    NonexistentLocalTime(String),

    #[error("invalid value '{0}'")]
    InvalidValue(String),
}
