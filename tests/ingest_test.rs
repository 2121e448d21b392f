//! Ingestion against a real schema: atomicity, batch import and telemetry history.
//!
//! Run with: cargo test --test ingest_test

mod common;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use tokio_test::{assert_err, assert_ok};

use plant_telemetry::entity::{faults, raw_strings, readings};
use plant_telemetry::error::AppError;
use plant_telemetry::services::registry;
use plant_telemetry::telemetry::{self, history, ingest::read_csv_payloads, Outcome};

use common::World;

async fn counts(db: &DatabaseConnection) -> (u64, u64, u64) {
    (
        raw_strings::Entity::find().count(db).await.unwrap(),
        readings::Entity::find().count(db).await.unwrap(),
        faults::Entity::find().count(db).await.unwrap(),
    )
}

#[tokio::test]
async fn reading_is_stored_with_its_raw_string() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;

    let raw = "S001 E(202401151230000042)Nessuno";
    let ingested = assert_ok!(telemetry::ingest(&world.db, Tz::UTC, raw).await);

    assert_eq!(ingested.raw_string.payload, raw);
    let Outcome::Reading(reading) = ingested.outcome else {
        panic!("expected a reading");
    };
    assert_eq!(reading.sensor_id, "S001");
    assert_eq!(reading.raw_string_id, ingested.raw_string.id);
    assert_eq!(reading.value, 42);
    assert_eq!(reading.message.as_deref(), Some("Nessuno"));
    assert_eq!(
        reading.recorded_at,
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap()
    );

    assert_eq!(counts(&world.db).await, (1, 1, 0));
}

#[tokio::test]
async fn fault_code_produces_fault_and_no_reading() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;

    let ingested = assert_ok!(telemetry::ingest(&world.db, Tz::UTC, "S001 E(999)Guasto").await);

    let Outcome::Fault(fault) = ingested.outcome else {
        panic!("expected a fault");
    };
    assert_eq!(fault.sensor_id, "S001");
    assert_eq!(fault.message.as_deref(), Some("Guasto"));
    assert_eq!(counts(&world.db).await, (1, 0, 1));
}

#[tokio::test]
async fn unknown_sensor_persists_nothing() {
    let world = World::new().await;

    let err = assert_err!(
        telemetry::ingest(&world.db, Tz::UTC, "S404 E(202401151230000042)Nessuno").await
    );
    assert!(matches!(err, AppError::UnknownSensor(ref id) if id == "S404"));
    assert!(err.is_decode_failure());
    assert_eq!(counts(&world.db).await, (0, 0, 0));
}

#[tokio::test]
async fn malformed_payload_persists_nothing() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    let err = assert_err!(telemetry::ingest(&world.db, Tz::UTC, "S001 E(12345)x").await);
    assert!(matches!(err, AppError::MalformedPayload(_)));

    let err = assert_err!(telemetry::ingest(&world.db, Tz::UTC, "S001").await);
    assert!(matches!(err, AppError::MalformedPayload(_)));

    assert_eq!(counts(&world.db).await, (0, 0, 0));
}

#[tokio::test]
async fn blank_or_oversized_payload_is_rejected() {
    let world = World::new().await;

    let err = assert_err!(telemetry::ingest(&world.db, Tz::UTC, "   ").await);
    assert!(matches!(err, AppError::BadRequest(_)));

    let long = format!("S001 E(999){}", "x".repeat(200));
    let err = assert_err!(telemetry::ingest(&world.db, Tz::UTC, &long).await);
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn timezone_is_applied_when_decoding() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    let ingested = assert_ok!(
        telemetry::ingest(
            &world.db,
            chrono_tz::Europe::Rome,
            "S001 E(202401151230000042)Nessuno"
        )
        .await
    );
    let Outcome::Reading(reading) = ingested.outcome else {
        panic!("expected a reading");
    };
    assert_eq!(
        reading.recorded_at,
        Utc.with_ymd_and_hms(2024, 1, 15, 11, 30, 0).unwrap()
    );
}

#[tokio::test]
async fn batch_rejects_bad_lines_and_keeps_going() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    let lines = [
        "S001 E(202401151230000042)Nessuno",
        "S404 E(202401151230000042)Nessuno",
        "S001 E(12)x",
        "S001 E(999)Guasto",
    ];
    let report = assert_ok!(telemetry::ingest_batch(&world.db, Tz::UTC, lines).await);

    assert_eq!(report.accepted, 2);
    let rejected: Vec<usize> = report.rejected.iter().map(|r| r.line).collect();
    assert_eq!(rejected, vec![2, 3]);
    assert_eq!(report.rejected[0].payload, lines[1]);
    assert_eq!(counts(&world.db).await, (2, 1, 1));
}

#[test]
fn csv_payloads_come_from_the_stringa_column() {
    let csv = b"id,stringa\n1,S001 E(999)Guasto\n2,\n3,\"S001 E(202401151230000042)Nessuno, ok\"\n";
    let payloads = assert_ok!(read_csv_payloads(csv));
    assert_eq!(
        payloads,
        vec![
            "S001 E(999)Guasto".to_string(),
            "S001 E(202401151230000042)Nessuno, ok".to_string(),
        ]
    );
}

#[test]
fn csv_without_stringa_column_is_rejected() {
    let err = assert_err!(read_csv_payloads(b"payload\nS001 E(999)x\n"));
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn readings_are_listed_newest_first() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    for raw in [
        "S001 E(202401151230000001)a",
        "S001 E(202401171230000003)c",
        "S001 E(202401161230000002)b",
    ] {
        assert_ok!(telemetry::ingest(&world.db, Tz::UTC, raw).await);
    }

    let values: Vec<i64> = history::readings_for_sensor(&world.db, "S001")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.value)
        .collect();
    assert_eq!(values, vec![3, 2, 1]);
}

#[tokio::test]
async fn faults_are_listed_newest_first() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    for raw in ["S001 E(999)primo", "S001 E(999)secondo"] {
        assert_ok!(telemetry::ingest(&world.db, Tz::UTC, raw).await);
    }

    let messages: Vec<String> = history::faults_for_sensor(&world.db, "S001")
        .await
        .unwrap()
        .into_iter()
        .filter_map(|f| f.message)
        .collect();
    assert_eq!(messages, vec!["secondo".to_string(), "primo".to_string()]);
}

#[tokio::test]
async fn deleting_a_reading_removes_its_raw_string() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    let ingested = assert_ok!(
        telemetry::ingest(&world.db, Tz::UTC, "S001 E(202401151230000042)Nessuno").await
    );
    let Outcome::Reading(reading) = ingested.outcome else {
        panic!("expected a reading");
    };

    assert_ok!(history::delete_reading(&world.db, reading.id).await);
    assert_eq!(counts(&world.db).await, (0, 0, 0));

    let err = assert_err!(history::delete_reading(&world.db, reading.id).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_sensor_removes_its_telemetry() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;
    world.sensor("S002", Some(&world.plant_a)).await;

    for raw in [
        "S001 E(202401151230000042)Nessuno",
        "S001 E(999)Guasto",
        "S002 E(202401151230000007)Nessuno",
    ] {
        assert_ok!(telemetry::ingest(&world.db, Tz::UTC, raw).await);
    }

    assert_ok!(registry::delete_sensor(&world.db, "S001").await);

    assert_eq!(counts(&world.db).await, (1, 1, 0));
    let err = assert_err!(registry::get_sensor(&world.db, "S001").await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn absent_message_is_stored_as_sentinel() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    let ingested = assert_ok!(telemetry::ingest(&world.db, Tz::UTC, "S001 E(999)").await);
    let Outcome::Fault(fault) = ingested.outcome else {
        panic!("expected a fault");
    };
    assert_eq!(fault.message.as_deref(), Some("Nessuno"));

    let ingested = assert_ok!(
        telemetry::ingest(&world.db, Tz::UTC, "S001 E(202401151230000042)").await
    );
    let Outcome::Reading(reading) = ingested.outcome else {
        panic!("expected a reading");
    };
    assert_eq!(reading.message.as_deref(), Some("Nessuno"));
}
