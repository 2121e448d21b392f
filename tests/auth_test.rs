//! Credential parsing and authentication.
//!
//! Run with: cargo test --test auth_test

mod common;

use axum::http::{header, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};
use tokio_test::{assert_err, assert_ok};

use plant_telemetry::config::BootstrapStaff;
use plant_telemetry::entity::sessions;
use plant_telemetry::error::AppError;
use plant_telemetry::services::auth::{self, Credentials};

use common::{token_for, World, PASSWORD};

fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(name, HeaderValue::from_str(value).unwrap());
    map
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

#[test]
fn token_and_bearer_schemes_are_accepted() {
    assert_eq!(
        auth::extract_credentials(&headers(header::AUTHORIZATION, "Token abc123")),
        Some(Credentials::Token("abc123".to_string()))
    );
    assert_eq!(
        auth::extract_credentials(&headers(header::AUTHORIZATION, "bearer abc123")),
        Some(Credentials::Token("abc123".to_string()))
    );
}

#[test]
fn basic_scheme_is_decoded() {
    assert_eq!(
        auth::extract_credentials(&headers(header::AUTHORIZATION, &basic("mario", "p:w"))),
        Some(Credentials::Basic {
            username: "mario".to_string(),
            password: "p:w".to_string(),
        })
    );
}

#[test]
fn session_cookie_is_found_among_others() {
    assert_eq!(
        auth::extract_credentials(&headers(
            header::COOKIE,
            "csrftoken=zzz; sessionid=k3y; theme=dark"
        )),
        Some(Credentials::Session("k3y".to_string()))
    );
}

#[test]
fn garbage_is_not_credentials() {
    assert_eq!(auth::extract_credentials(&HeaderMap::new()), None);
    assert_eq!(
        auth::extract_credentials(&headers(header::AUTHORIZATION, "Basic not-base64!")),
        None
    );
    assert_eq!(
        auth::extract_credentials(&headers(header::AUTHORIZATION, "Digest abc")),
        None
    );
    assert_eq!(
        auth::extract_credentials(&headers(header::COOKIE, "sessionid=")),
        None
    );
}

#[tokio::test]
async fn api_token_authenticates() {
    let world = World::new().await;

    let user = assert_ok!(
        auth::authenticate(&world.db, Credentials::Token(token_for("mario"))).await
    );
    assert_eq!(user.id, world.owner.id);

    let err = assert_err!(
        auth::authenticate(&world.db, Credentials::Token("nope".to_string())).await
    );
    assert!(matches!(err, AppError::Unauthenticated));
}

#[tokio::test]
async fn basic_credentials_check_the_password() {
    let world = World::new().await;

    let user = assert_ok!(
        auth::authenticate(
            &world.db,
            Credentials::Basic {
                username: "admin".to_string(),
                password: PASSWORD.to_string(),
            }
        )
        .await
    );
    assert!(user.is_staff);

    let err = assert_err!(
        auth::authenticate(
            &world.db,
            Credentials::Basic {
                username: "admin".to_string(),
                password: "wrong".to_string(),
            }
        )
        .await
    );
    assert!(matches!(err, AppError::Unauthenticated));

    let err = assert_err!(
        auth::authenticate(
            &world.db,
            Credentials::Basic {
                username: "ghost".to_string(),
                password: PASSWORD.to_string(),
            }
        )
        .await
    );
    assert!(matches!(err, AppError::Unauthenticated));
}

#[tokio::test]
async fn only_unexpired_sessions_authenticate() {
    let world = World::new().await;

    for (key, expires) in [
        ("live", Utc::now() + Duration::hours(1)),
        ("stale", Utc::now() - Duration::hours(1)),
    ] {
        sessions::ActiveModel {
            session_key: Set(key.to_string()),
            user_id: Set(world.owner.id),
            expires_at: Set(expires.fixed_offset()),
        }
        .insert(&world.db)
        .await
        .unwrap();
    }

    let user = assert_ok!(
        auth::authenticate(&world.db, Credentials::Session("live".to_string())).await
    );
    assert_eq!(user.id, world.owner.id);

    let err = assert_err!(
        auth::authenticate(&world.db, Credentials::Session("stale".to_string())).await
    );
    assert!(matches!(err, AppError::Unauthenticated));
}

#[tokio::test]
async fn bootstrap_staff_is_created_once() {
    let world = World::new().await;
    let bootstrap = BootstrapStaff {
        username: "ops".to_string(),
        password: "ops-password".to_string(),
        api_token: "ops-token".to_string(),
    };

    let created = assert_ok!(auth::ensure_staff_user(&world.db, &bootstrap).await);
    let created = created.expect("user should be created");
    assert!(created.is_staff);
    assert_eq!(created.username, "ops");

    let again = assert_ok!(auth::ensure_staff_user(&world.db, &bootstrap).await);
    assert!(again.is_none());

    let user = assert_ok!(
        auth::authenticate(&world.db, Credentials::Token("ops-token".to_string())).await
    );
    assert_eq!(user.id, created.id);
}
