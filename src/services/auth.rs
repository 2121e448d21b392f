//! Caller authentication for the HTTP API.
//!
//! Accepted credentials, checked in this order:
//!
//! - `Authorization: Token <api token>` or `Authorization: Bearer <api token>`
//! - `Authorization: Basic <base64 username:password>`, verified with bcrypt
//! - a `sessionid` cookie naming an unexpired session
//!
//! Sessions are written by the login front-end; this service only reads them.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::config::BootstrapStaff;
use crate::entity::{sessions, users};
use crate::error::{AppError, AppResult};

pub const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Basic { username: String, password: String },
    Session(String),
}

fn parse_authorization(value: &str) -> Option<Credentials> {
    let (scheme, rest) = value.trim().split_once(' ')?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        return Some(Credentials::Token(rest.to_string()));
    }

    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD.decode(rest).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        return Some(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    None
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, key)| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Pull credentials out of request headers without touching the database.
#[must_use]
pub fn extract_credentials(headers: &HeaderMap) -> Option<Credentials> {
    if let Some(creds) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization)
    {
        return Some(creds);
    }
    session_cookie(headers).map(Credentials::Session)
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password check panicked: {e}")))?
        .map_err(|e| AppError::Internal(format!("Stored password hash is unusable: {e}")))
}

/// Resolve credentials to a user.
///
/// # Errors
///
/// Returns `AppError::Unauthenticated` if the credentials match no user, the
/// password is wrong, or the session has expired.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    credentials: Credentials,
) -> AppResult<users::Model> {
    let user = match credentials {
        Credentials::Token(token) => {
            users::Entity::find()
                .filter(users::Column::ApiToken.eq(token))
                .one(db)
                .await?
        }
        Credentials::Basic { username, password } => {
            let Some(user) = users::Entity::find()
                .filter(users::Column::Username.eq(username.as_str()))
                .one(db)
                .await?
            else {
                return Err(AppError::Unauthenticated);
            };
            if verify_password(password, user.password_hash.clone()).await? {
                Some(user)
            } else {
                tracing::warn!(username = %username, "Rejected basic credentials");
                None
            }
        }
        Credentials::Session(key) => {
            let session = sessions::Entity::find_by_id(key)
                .filter(sessions::Column::ExpiresAt.gt(Utc::now().fixed_offset()))
                .one(db)
                .await?;
            match session {
                Some(session) => users::Entity::find_by_id(session.user_id).one(db).await?,
                None => None,
            }
        }
    };

    user.ok_or(AppError::Unauthenticated)
}

/// Hash a password with the given bcrypt cost.
///
/// # Errors
///
/// Returns `AppError::Internal` if bcrypt rejects the cost.
pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(format!("Hashing failed: {e}")))
}

pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password_hash: String,
    api_token: &str,
    is_staff: bool,
    now: DateTime<Utc>,
) -> AppResult<users::Model> {
    if username.trim().is_empty() {
        return Err(AppError::BadRequest("username must not be blank".to_string()));
    }
    if api_token.trim().is_empty() {
        return Err(AppError::BadRequest("api token must not be blank".to_string()));
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        api_token: Set(api_token.to_string()),
        is_staff: Set(is_staff),
        created_at: Set(now.fixed_offset()),
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, is_staff, "User created");
    Ok(user)
}

/// Create the bootstrap staff account unless the username is already taken.
///
/// Returns the user when it was created.
pub async fn ensure_staff_user<C: ConnectionTrait>(
    db: &C,
    bootstrap: &BootstrapStaff,
) -> AppResult<Option<users::Model>> {
    let existing = users::Entity::find()
        .filter(users::Column::Username.eq(bootstrap.username.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        tracing::debug!(username = %bootstrap.username, "Bootstrap staff user already present");
        return Ok(None);
    }

    let password = bootstrap.password.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing panicked: {e}")))??;

    create_user(
        db,
        &bootstrap.username,
        password_hash,
        &bootstrap.api_token,
        true,
        Utc::now(),
    )
    .await
    .map(Some)
}
