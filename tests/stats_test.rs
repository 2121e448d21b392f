//! Dashboard aggregations.
//!
//! Run with: cargo test --test stats_test

mod common;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tokio_test::assert_ok;

use plant_telemetry::services::{registry, stats, tracker};
use plant_telemetry::telemetry;

use common::World;

fn reading_at(sensor_id: &str, at: DateTime<Utc>, value: i64) -> String {
    format!("{sensor_id} E({}{value})Nessuno", at.format("%Y%m%d%H%M%S"))
}

#[tokio::test]
async fn active_since_counts_installed_sensors_with_recent_readings() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;
    world.sensor("S002", Some(&world.plant_a)).await;
    world.sensor("S003", Some(&world.plant_b)).await;
    world.sensor("S004", Some(&world.plant_a)).await;

    let now = Utc::now();
    for raw in [
        reading_at("S001", now - Duration::hours(1), 1),
        reading_at("S001", now - Duration::hours(2), 2),
        reading_at("S002", now - Duration::hours(48), 3),
        reading_at("S003", now - Duration::hours(1), 4),
        reading_at("S004", now - Duration::hours(1), 5),
    ] {
        assert_ok!(telemetry::ingest(&world.db, Tz::UTC, &raw).await);
    }
    // Recent telemetry does not make a retired sensor active
    assert_ok!(tracker::detach(&world.db, "S004", world.plant_a.id, now).await);

    let active = assert_ok!(
        stats::sensors_active_since(&world.db, world.plant_a.id, now - Duration::hours(24)).await
    );
    let ids: Vec<&str> = active.sensors.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["S001"]);
    assert_eq!(active.count, 1);

    let wider = assert_ok!(
        stats::sensors_active_since(&world.db, world.plant_a.id, now - Duration::hours(72)).await
    );
    assert_eq!(wider.count, 2);
}

#[tokio::test]
async fn type_usage_groups_open_installations_by_type_name() {
    let world = World::new().await;
    let pressure = assert_ok!(registry::create_sensor_type(&world.db, "Pressione").await);

    world.sensor("S001", Some(&world.plant_a)).await;
    world.sensor("S002", Some(&world.plant_a)).await;
    world
        .sensor_with_type("S003", Some(&world.plant_a), pressure.id)
        .await;
    world
        .sensor_with_type("S004", Some(&world.plant_b), pressure.id)
        .await;
    world
        .sensor_with_type("S005", Some(&world.plant_a), pressure.id)
        .await;
    assert_ok!(tracker::detach(&world.db, "S005", world.plant_a.id, Utc::now()).await);

    let usage = assert_ok!(stats::type_usage_counts(&world.db, world.plant_a.id).await);
    let pairs: Vec<(&str, i64)> = usage
        .iter()
        .map(|u| (u.type_name.as_str(), u.sensor_count))
        .collect();
    assert_eq!(pairs, vec![("Pressione", 1), ("Temperatura", 2)]);
}

#[tokio::test]
async fn fault_trend_counts_over_the_recent_set() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;
    world.sensor("S002", Some(&world.plant_a)).await;
    world.sensor("S003", Some(&world.plant_b)).await;

    for raw in [
        "S001 E(999)f1",
        "S002 E(999)f2",
        "S001 E(999)f3",
        "S003 E(999)other plant",
        "S002 E(999)f4",
        "S001 E(999)f5",
    ] {
        assert_ok!(telemetry::ingest(&world.db, Tz::UTC, raw).await);
    }

    let trend = assert_ok!(stats::fault_trend(&world.db, world.plant_a.id, 3).await);

    let messages: Vec<&str> = trend
        .recent
        .iter()
        .filter_map(|f| f.message.as_deref())
        .collect();
    assert_eq!(messages, vec!["f5", "f4", "f3"]);

    let counts: Vec<(&str, usize)> = trend
        .per_sensor
        .iter()
        .map(|c| (c.sensor_id.as_str(), c.count))
        .collect();
    assert_eq!(counts, vec![("S001", 2), ("S002", 1)]);
}

#[tokio::test]
async fn empty_plant_has_empty_dashboard() {
    let world = World::new().await;

    let active = assert_ok!(
        stats::sensors_active_since(&world.db, world.plant_a.id, Utc::now() - Duration::hours(24))
            .await
    );
    assert_eq!(active.count, 0);
    assert!(assert_ok!(stats::type_usage_counts(&world.db, world.plant_a.id).await).is_empty());

    let trend = assert_ok!(stats::fault_trend(&world.db, world.plant_a.id, 10).await);
    assert!(trend.recent.is_empty());
    assert!(trend.per_sensor.is_empty());
}
