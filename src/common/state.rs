use moka::future::Cache;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Serialized response body kept in the dashboard cache
#[derive(Clone)]
pub struct CachedResponse {
    pub data: Arc<Vec<u8>>,
}

/// Dashboard responses keyed by plant and window. Weighted by byte size to enforce memory limit.
pub type ResponseCache = Cache<String, CachedResponse>;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub dashboard_cache: ResponseCache,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        // Cache weighted by byte size, not entry count
        let cache: ResponseCache = Cache::builder()
            .weigher(|_key: &String, value: &CachedResponse| -> u32 {
                value.data.len().try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(config.cache_max_bytes)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
            .build();

        Self {
            db,
            config: Arc::new(config),
            dashboard_cache: cache,
        }
    }

    /// Drop every cached dashboard; called after telemetry changes.
    pub fn invalidate_dashboards(&self) {
        self.dashboard_cache.invalidate_all();
    }
}
