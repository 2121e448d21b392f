//! Unit tests for the telemetry tokenizer and classifier. No database involved.
//!
//! Run with: cargo test --test grammar_unit_test

use chrono::{TimeZone, Utc};
use chrono_tz::{Europe::Rome, Tz};

use plant_telemetry::telemetry::decode::parse_timestamp;
use plant_telemetry::telemetry::{
    classify, tokenize, DecodeError, Decoded, DecodedFault, Frame, NO_MESSAGE,
};

fn decode(raw: &str, fault_code: &str, tz: Tz) -> Result<Decoded, DecodeError> {
    classify(&tokenize(raw)?, fault_code, tz)
}

#[test]
fn tokenize_splits_sensor_digits_and_message() {
    let frame = tokenize("S001 E(202401151230000042)Nessuno").expect("valid frame");
    assert_eq!(
        frame,
        Frame {
            sensor_id: "S001",
            prefix: "E(",
            digits: "202401151230000042",
            message: Some("Nessuno"),
        }
    );
}

#[test]
fn tokenize_keeps_spaces_in_message() {
    let frame = tokenize("S001 E(999)Guasto alla pompa").expect("valid frame");
    assert_eq!(frame.digits, "999");
    assert_eq!(frame.message, Some("Guasto alla pompa"));
}

#[test]
fn tokenize_reports_missing_message_as_none() {
    assert_eq!(tokenize("S001 E(999)").expect("valid frame").message, None);
    assert_eq!(tokenize("S001 999").expect("valid frame").message, None);
}

#[test]
fn tokenize_accepts_empty_prefix_and_no_parenthesis() {
    let frame = tokenize("S001 202401151230007ok").expect("valid frame");
    assert_eq!(frame.prefix, "");
    assert_eq!(frame.digits, "202401151230007");
    assert_eq!(frame.message, Some("ok"));
}

#[test]
fn tokenize_ignores_surrounding_whitespace() {
    let frame = tokenize("  S001 E(999)Guasto\n").expect("valid frame");
    assert_eq!(frame.sensor_id, "S001");
    assert_eq!(frame.message, Some("Guasto"));
}

#[test]
fn tokenize_rejects_malformed_input() {
    assert_eq!(tokenize(""), Err(DecodeError::Empty));
    assert_eq!(tokenize("   "), Err(DecodeError::Empty));
    assert_eq!(tokenize("S001"), Err(DecodeError::MissingSeparator));
    assert_eq!(tokenize("S001 E()Guasto"), Err(DecodeError::MissingDigits));
}

#[test]
fn tokenize_only_counts_ascii_digits() {
    // Arabic-Indic digits are not part of the digit run
    assert_eq!(tokenize("S001 E(٣٤)"), Err(DecodeError::MissingDigits));
}

#[test]
fn reading_example_decodes_timestamp_and_value() {
    let Decoded::Reading(reading) =
        decode("S001 E(202401151230000042)Nessuno", "999", Tz::UTC).expect("decodes")
    else {
        panic!("expected a reading");
    };

    assert_eq!(
        reading.recorded_at,
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap()
    );
    assert_eq!(reading.value, 42);
    assert_eq!(reading.message, "Nessuno");
}

#[test]
fn fault_example_matches_fault_code() {
    assert_eq!(
        decode("S001 E(999)Guasto", "999", Tz::UTC),
        Ok(Decoded::Fault(DecodedFault {
            message: "Guasto".to_string(),
        }))
    );
}

#[test]
fn missing_message_becomes_sentinel() {
    assert_eq!(
        decode("S001 E(999)", "999", Tz::UTC),
        Ok(Decoded::Fault(DecodedFault {
            message: NO_MESSAGE.to_string(),
        }))
    );

    let Decoded::Reading(reading) =
        decode("S001 E(2024011512300017)", "999", Tz::UTC).expect("decodes")
    else {
        panic!("expected a reading");
    };
    assert_eq!(reading.message, NO_MESSAGE);
    assert_eq!(reading.value, 17);
}

#[test]
fn fault_code_comparison_is_textual() {
    // "0999" is not "999": falls through to reading decoding and is too short
    assert_eq!(
        decode("S001 E(0999)x", "999", Tz::UTC),
        Err(DecodeError::TimestampTooShort(4))
    );
    assert!(matches!(
        decode("S001 E(0999)x", "0999", Tz::UTC),
        Ok(Decoded::Fault(_))
    ));
}

#[test]
fn short_digit_run_is_malformed() {
    assert_eq!(
        decode("S001 E(2024011512)x", "999", Tz::UTC),
        Err(DecodeError::TimestampTooShort(10))
    );
}

#[test]
fn timestamp_without_value_is_malformed() {
    assert_eq!(
        decode("S001 E(20240115123000)x", "999", Tz::UTC),
        Err(DecodeError::InvalidValue(String::new()))
    );
}

#[test]
fn oversized_value_is_malformed() {
    let raw = "S001 E(2024011512300099999999999999999999)x";
    assert!(matches!(
        decode(raw, "999", Tz::UTC),
        Err(DecodeError::InvalidValue(_))
    ));
}

#[test]
fn impossible_dates_are_rejected() {
    assert_eq!(
        parse_timestamp("20241315123000", Tz::UTC),
        Err(DecodeError::InvalidTimestamp("20241315123000".to_string()))
    );
    assert_eq!(
        parse_timestamp("20240230000000", Tz::UTC),
        Err(DecodeError::InvalidTimestamp("20240230000000".to_string()))
    );
    assert_eq!(
        parse_timestamp("20240115246000", Tz::UTC),
        Err(DecodeError::InvalidTimestamp("20240115246000".to_string()))
    );
}

#[test]
fn timestamps_are_local_to_the_given_timezone() {
    // Winter time in Rome is UTC+1
    let at = parse_timestamp("20240115123000", Rome).expect("valid");
    assert_eq!(at, Utc.with_ymd_and_hms(2024, 1, 15, 11, 30, 0).unwrap());

    // Summer time is UTC+2
    let at = parse_timestamp("20240715123000", Rome).expect("valid");
    assert_eq!(at, Utc.with_ymd_and_hms(2024, 7, 15, 10, 30, 0).unwrap());
}

#[test]
fn ambiguous_local_time_resolves_to_earliest_instant() {
    // 02:30 happens twice on 2024-10-27 in Rome; the first one is still UTC+2
    let at = parse_timestamp("20241027023000", Rome).expect("valid");
    assert_eq!(at, Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());
}

#[test]
fn skipped_local_time_is_rejected() {
    // Clocks jump from 02:00 to 03:00 on 2024-03-31 in Rome
    assert_eq!(
        parse_timestamp("20240331023000", Rome),
        Err(DecodeError::NonexistentLocalTime("20240331023000".to_string()))
    );
}
