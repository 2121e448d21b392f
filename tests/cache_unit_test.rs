//! Unit tests for cache module.
//!
//! Run with: cargo test --test cache_unit_test

use plant_telemetry::routes::cache;

#[test]
fn cache_key_builds_correctly() {
    assert_eq!(cache::cache_key("dashboard", &[]), "dashboard");
    assert_eq!(
        cache::cache_key("dashboard", &["6f1c", "24"]),
        "dashboard:6f1c:24"
    );

    // Empty components preserved (ensures query uniqueness)
    assert_ne!(
        cache::cache_key("dashboard", &["6f1c", "", "24"]),
        cache::cache_key("dashboard", &["6f1c", "24"])
    );
}

#[test]
fn json_response_marks_cache_status() {
    let hit = cache::json_response(b"{}".to_vec(), true).expect("build response");
    assert_eq!(hit.headers()["X-Cache"], "HIT");
    assert_eq!(hit.headers()["content-type"], "application/json");

    let miss = cache::json_response(b"{}".to_vec(), false).expect("build response");
    assert_eq!(miss.headers()["X-Cache"], "MISS");
}
