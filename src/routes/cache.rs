//! Response caching for the plant dashboard.
//!
//! Dashboard aggregations scan readings and faults, so serialized responses
//! are kept in the moka cache on [`AppState`] until their TTL expires or new
//! telemetry is ingested, whichever comes first.
//!
//! # Usage
//!
//! ```text
//! let key = cache::cache_key("dashboard", &[&plant_id.to_string(), &hours]);
//! if let Some(cached) = cache::get_cached(&state, &key).await {
//!     return cache::json_response((*cached).to_vec(), true);
//! }
//! // ... compute response ...
//! cache::cache_and_respond(&state, key, &response).await
//! ```

use axum::{
    http::{header, HeaderValue},
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

use crate::common::{AppState, CachedResponse};
use crate::error::{AppError, AppResult};

/// Build a cache key from a prefix and components.
///
/// Components are joined with `:` separator. Empty components are included
/// to ensure different queries produce different keys.
#[must_use]
pub fn cache_key(prefix: &str, components: &[&str]) -> String {
    let mut key = prefix.to_string();
    for c in components {
        key.push(':');
        key.push_str(c);
    }
    key
}

pub async fn get_cached(state: &AppState, cache_key: &str) -> Option<Arc<Vec<u8>>> {
    let cached = state.dashboard_cache.get(cache_key).await?;
    tracing::debug!(cache_key = %cache_key, "cache_hit");
    Some(cached.data)
}

pub async fn store_cached(state: &AppState, cache_key: String, data: Vec<u8>) {
    state
        .dashboard_cache
        .insert(
            cache_key,
            CachedResponse {
                data: Arc::new(data),
            },
        )
        .await;
}

/// Build a JSON response with X-Cache header
pub fn json_response(data: Vec<u8>, cache_hit: bool) -> AppResult<Response> {
    let cache_header = if cache_hit { "HIT" } else { "MISS" };
    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header("X-Cache", HeaderValue::from_static(cache_header))
        .body(axum::body::Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serialize and cache a response, then return it
pub async fn cache_and_respond<T: Serialize>(
    state: &AppState,
    cache_key: String,
    response: &T,
) -> AppResult<Response> {
    let json_bytes =
        serde_json::to_vec(response).map_err(|e| AppError::Internal(e.to_string()))?;

    store_cached(state, cache_key, json_bytes.clone()).await;

    json_response(json_bytes, false)
}
