use axum::{extract::FromRequestParts, http::request::Parts};

use crate::common::AppState;
use crate::entity::users;
use crate::error::AppError;
use crate::services::auth::{authenticate, extract_credentials};

/// The authenticated caller. Rejects with 401 when credentials are absent or invalid.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub users::Model);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = extract_credentials(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let user = authenticate(&state.db, credentials).await?;
        Ok(Self(user))
    }
}
