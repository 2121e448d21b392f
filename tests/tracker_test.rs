//! Installation history: attach, detach, move and restore.
//!
//! Run with: cargo test --test tracker_test

mod common;

use chrono::{Duration, TimeZone, Utc};
use sea_orm::{EntityTrait, PaginatorTrait};
use tokio_test::{assert_err, assert_ok};

use plant_telemetry::entity::installations;
use plant_telemetry::error::AppError;
use plant_telemetry::services::tracker::{self, MoveOutcome};

use common::World;

#[tokio::test]
async fn attach_detach_attach_leaves_one_closed_and_one_open() {
    let world = World::new().await;
    world.sensor("S001", None).await;
    let t0 = Utc::now();

    let first = assert_ok!(tracker::attach(&world.db, "S001", world.plant_a.id, t0).await);
    assert!(first.is_open());

    let closed = assert_ok!(
        tracker::detach(&world.db, "S001", world.plant_a.id, t0 + Duration::minutes(5)).await
    );
    assert_eq!(closed.id, first.id);
    assert!(!closed.is_open());

    let second = assert_ok!(
        tracker::attach(&world.db, "S001", world.plant_b.id, t0 + Duration::minutes(10)).await
    );

    let history = assert_ok!(tracker::history(&world.db, "S001").await);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, first.id);
    assert!(history[0].ended_at.is_some());
    assert_eq!(history[1].id, second.id);
    assert_eq!(history[1].plant_id, world.plant_b.id);
    assert!(history[1].ended_at.is_none());
}

#[tokio::test]
async fn attach_refuses_a_second_open_installation() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;

    let err = assert_err!(tracker::attach(&world.db, "S001", world.plant_b.id, Utc::now()).await);
    assert!(matches!(err, AppError::Conflict(_)));

    let open = installations::Entity::find().count(&world.db).await.unwrap();
    assert_eq!(open, 1);
}

#[tokio::test]
async fn attach_requires_existing_sensor_and_plant() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    let err = assert_err!(tracker::attach(&world.db, "S404", world.plant_a.id, Utc::now()).await);
    assert!(matches!(err, AppError::NotFound(_)));

    let err = assert_err!(tracker::attach(&world.db, "S001", uuid::Uuid::new_v4(), Utc::now()).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn detach_without_open_installation_is_not_found() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;

    // Open, but at the other plant
    let err = assert_err!(tracker::detach(&world.db, "S001", world.plant_b.id, Utc::now()).await);
    assert!(matches!(err, AppError::NotFound(_)));

    assert_ok!(tracker::detach(&world.db, "S001", world.plant_a.id, Utc::now()).await);
    let err = assert_err!(tracker::detach(&world.db, "S001", world.plant_a.id, Utc::now()).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn move_closes_old_and_opens_new_installation() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;
    let at = Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap();

    let outcome = assert_ok!(tracker::move_sensor(&world.db, "S001", world.plant_b.id, at).await);
    let MoveOutcome::Moved { closed, opened } = outcome else {
        panic!("expected the sensor to move");
    };
    assert_eq!(closed.plant_id, world.plant_a.id);
    assert_eq!(closed.ended_at, Some(at.fixed_offset()));
    assert_eq!(opened.plant_id, world.plant_b.id);
    assert_eq!(opened.started_at, at.fixed_offset());
    assert!(opened.is_open());

    let current = assert_ok!(tracker::current_installation(&world.db, "S001").await);
    assert_eq!(current.map(|i| i.id), Some(opened.id));

    let plant = assert_ok!(tracker::current_plant(&world.db, "S001").await);
    assert_eq!(plant.map(|p| p.id), Some(world.plant_b.id));
}

#[tokio::test]
async fn move_to_current_plant_changes_nothing() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;

    let outcome =
        assert_ok!(tracker::move_sensor(&world.db, "S001", world.plant_a.id, Utc::now()).await);
    assert!(matches!(outcome, MoveOutcome::Unchanged(_)));
    assert_eq!(outcome.current().plant_id, world.plant_a.id);

    let history = assert_ok!(tracker::history(&world.db, "S001").await);
    assert_eq!(history.len(), 1);
    assert!(history[0].is_open());
}

#[tokio::test]
async fn move_of_uninstalled_sensor_is_not_found() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    let err =
        assert_err!(tracker::move_sensor(&world.db, "S001", world.plant_b.id, Utc::now()).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn restore_reopens_latest_installation_without_new_row() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;
    let closed = assert_ok!(tracker::detach(&world.db, "S001", world.plant_a.id, Utc::now()).await);

    let restored = assert_ok!(tracker::restore(&world.db, "S001").await);
    assert_eq!(restored.id, closed.id);
    assert!(restored.is_open());

    let history = assert_ok!(tracker::history(&world.db, "S001").await);
    assert_eq!(history.len(), 1);

    // Restoring again is a no-op
    let again = assert_ok!(tracker::restore(&world.db, "S001").await);
    assert_eq!(again, restored);
}

#[tokio::test]
async fn restore_picks_the_most_recent_installation() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;
    assert_ok!(tracker::move_sensor(&world.db, "S001", world.plant_b.id, Utc::now()).await);
    assert_ok!(tracker::detach(&world.db, "S001", world.plant_b.id, Utc::now()).await);

    let restored = assert_ok!(tracker::restore(&world.db, "S001").await);
    assert_eq!(restored.plant_id, world.plant_b.id);
}

#[tokio::test]
async fn restore_never_installed_sensor_is_not_found() {
    let world = World::new().await;
    world.sensor("S001", None).await;

    let err = assert_err!(tracker::restore(&world.db, "S001").await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn active_and_retired_sensors_follow_installations() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;
    world.sensor("S002", Some(&world.plant_a)).await;
    world.sensor("S003", Some(&world.plant_a)).await;

    // S002 retired from A; S003 moved on to B
    assert_ok!(tracker::detach(&world.db, "S002", world.plant_a.id, Utc::now()).await);
    assert_ok!(tracker::move_sensor(&world.db, "S003", world.plant_b.id, Utc::now()).await);

    let active: Vec<String> = assert_ok!(tracker::active_sensors(&world.db, world.plant_a.id).await)
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(active, vec!["S001".to_string()]);

    let retired: Vec<String> =
        assert_ok!(tracker::retired_sensors(&world.db, world.plant_a.id).await)
            .into_iter()
            .map(|s| s.id)
            .collect();
    assert_eq!(retired, vec!["S002".to_string()]);

    let active_b: Vec<String> =
        assert_ok!(tracker::active_sensors(&world.db, world.plant_b.id).await)
            .into_iter()
            .map(|s| s.id)
            .collect();
    assert_eq!(active_b, vec!["S003".to_string()]);
}

#[tokio::test]
async fn active_sensors_are_newest_first() {
    let world = World::new().await;
    world.sensor("S001", Some(&world.plant_a)).await;
    world.sensor("S002", Some(&world.plant_a)).await;

    let active: Vec<String> = assert_ok!(tracker::active_sensors(&world.db, world.plant_a.id).await)
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(active, vec!["S002".to_string(), "S001".to_string()]);
}
