//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

use chrono_tz::Tz;

use crate::ratelimit::RateLimiterBackend;
use crate::reset::window::default_zones;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Shared secret expected in the x-cron-secret header
    pub cron_secret: String,

    /// Effective timezone for agents without a stored one
    pub default_timezone: Tz,

    /// Zones the reset job considers (defaults to the supported registry)
    pub reset_timezones: Vec<Tz>,

    /// Rate limit: requests per minute per client
    pub rate_limit_per_minute: i32,

    /// Rate limiter backend (memory or postgres)
    pub rate_limiter_backend: RateLimiterBackend,

    /// Run the in-process scheduler instead of relying on external cron
    pub internal_scheduler: bool,

    /// Interval between internal reset-job ticks, in seconds
    pub scheduler_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let cron_secret =
            env::var("CRON_SECRET").map_err(|_| ConfigError::MissingEnv("CRON_SECRET"))?;

        let default_timezone = env::var("DEFAULT_TIMEZONE")
            .unwrap_or_else(|_| "America/New_York".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DEFAULT_TIMEZONE"))?;

        let reset_timezones = match env::var("RESET_TIMEZONES") {
            Ok(raw) => parse_zone_list(&raw)?,
            Err(_) => default_zones(),
        };

        let rate_limit_per_minute = env::var("RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RATE_LIMIT_PER_MINUTE"))?;

        let rate_limiter_backend = env::var("RATE_LIMITER_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RATE_LIMITER_BACKEND"))?;

        let internal_scheduler = env::var("INTERNAL_SCHEDULER")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("INTERNAL_SCHEDULER"))?;

        let scheduler_interval_secs = env::var("SCHEDULER_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SCHEDULER_INTERVAL_SECS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            cron_secret,
            default_timezone,
            reset_timezones,
            rate_limit_per_minute,
            rate_limiter_backend,
            internal_scheduler,
            scheduler_interval_secs,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Parse a comma-separated list of IANA zone names
fn parse_zone_list(raw: &str) -> Result<Vec<Tz>, ConfigError> {
    raw.split(',')
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            name.parse()
                .map_err(|_| ConfigError::InvalidValue("RESET_TIMEZONES"))
        })
        .collect()
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
