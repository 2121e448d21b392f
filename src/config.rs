use chrono_tz::Tz;
use std::env;
use std::num::{NonZeroU32, NonZeroU64};
use std::str::FromStr;

/// Largest dashboard activity window, one leap year.
pub const MAX_WINDOW_HOURS: i64 = 24 * 366;

/// Read `name`, falling back to `default` when unset, and parse it.
fn parse_var<T, F>(lookup: &F, name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(name, raw.clone()))
}

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

/// Staff account created on start-up when it does not exist yet.
#[derive(Debug, Clone)]
pub struct BootstrapStaff {
    pub username: String,
    pub password: String,
    pub api_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Telemetry
    pub telemetry_timezone: Tz,
    pub active_window_hours: i64,
    pub fault_trend_limit: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_ingest_per_second: u64,
    pub rate_limit_ingest_burst: u32,
    pub rate_limit_query_per_second: u64,
    pub rate_limit_query_burst: u32,

    // Caching
    pub cache_ttl_seconds: u64,
    pub cache_max_bytes: u64,

    pub bootstrap_staff: Option<BootstrapStaff>,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set,
    /// and `ConfigError::Invalid` if a value does not parse or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source; `from_env` passes the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let active_window_hours: i64 = parse_var(&lookup, "ACTIVE_WINDOW_HOURS", "24")?;
        if !(1..=MAX_WINDOW_HOURS).contains(&active_window_hours) {
            return Err(ConfigError::Invalid(
                "ACTIVE_WINDOW_HOURS",
                active_window_hours.to_string(),
            ));
        }

        let bootstrap_staff = match (
            lookup("BOOTSTRAP_STAFF_USERNAME"),
            lookup("BOOTSTRAP_STAFF_PASSWORD"),
            lookup("BOOTSTRAP_STAFF_TOKEN"),
        ) {
            (Some(username), Some(password), Some(api_token)) => Some(BootstrapStaff {
                username,
                password,
                api_token,
            }),
            _ => None,
        };

        Ok(Self {
            // Database
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,

            // Telemetry
            telemetry_timezone: parse_var(&lookup, "TELEMETRY_TIMEZONE", "Europe/Rome")?,
            active_window_hours,
            fault_trend_limit: parse_var(&lookup, "FAULT_TREND_LIMIT", "10")?,

            // API settings
            api_host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: parse_var(&lookup, "API_PORT", "3000")?,

            // Rate limiting; a zero rate or burst cannot build a limiter
            disable_rate_limiting: parse_var(&lookup, "DISABLE_RATE_LIMITING", "false")?,
            rate_limit_ingest_per_second: parse_var::<NonZeroU64, _>(
                &lookup,
                "RATE_LIMIT_INGEST_PER_SECOND",
                "20",
            )?
            .get(),
            rate_limit_ingest_burst: parse_var::<NonZeroU32, _>(
                &lookup,
                "RATE_LIMIT_INGEST_BURST",
                "200",
            )?
            .get(),
            rate_limit_query_per_second: parse_var::<NonZeroU64, _>(
                &lookup,
                "RATE_LIMIT_QUERY_PER_SECOND",
                "5",
            )?
            .get(),
            rate_limit_query_burst: parse_var::<NonZeroU32, _>(
                &lookup,
                "RATE_LIMIT_QUERY_BURST",
                "60",
            )?
            .get(),

            // Caching
            cache_ttl_seconds: parse_var(&lookup, "CACHE_TTL_SECONDS", "60")?,
            cache_max_bytes: parse_var(&lookup, "CACHE_MAX_BYTES", "16777216")?, // 16MB default

            bootstrap_staff,

            // Application metadata
            deployment: Deployment::from_str(
                &lookup("DEPLOYMENT").unwrap_or_else(|| "local".to_string()),
            ),
        })
    }

    /// Configuration for tests and embedded use: no rate limiting, UTC decoding.
    #[must_use]
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            telemetry_timezone: Tz::UTC,
            active_window_hours: 24,
            fault_trend_limit: 10,
            api_host: "127.0.0.1".to_string(),
            api_port: 0,
            disable_rate_limiting: true,
            rate_limit_ingest_per_second: 20,
            rate_limit_ingest_burst: 200,
            rate_limit_query_per_second: 5,
            rate_limit_query_burst: 60,
            cache_ttl_seconds: 60,
            cache_max_bytes: 16_777_216,
            bootstrap_staff: None,
            deployment: Deployment::Local,
        }
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
