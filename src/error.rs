use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::SqlErr;
use serde_json::json;

use crate::telemetry::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sea_orm::DbErr),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown sensor: {0}")]
    UnknownSensor(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] DecodeError),

    #[error("Referential integrity: {0}")]
    ReferentialIntegrity(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Authentication required")]
    Unauthenticated,
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::DuplicateKey(detail),
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                Self::ReferentialIntegrity(detail)
            }
            _ => Self::Database(err),
        }
    }
}

impl AppError {
    /// Errors caused by the telemetry payload itself rather than the server.
    #[must_use]
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::UnknownSensor(_) | Self::MalformedPayload(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Database(e) => {
                tracing::error!("Database error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::UnknownSensor(id) => (
                StatusCode::BAD_REQUEST,
                format!("Sensor '{id}' is not registered"),
            ),
            Self::MalformedPayload(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::ReferentialIntegrity(msg) | Self::DuplicateKey(msg) | Self::Conflict(msg) => {
                (StatusCode::CONFLICT, msg.clone())
            }
            Self::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided or are invalid".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
