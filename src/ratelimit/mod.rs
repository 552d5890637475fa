//! Rate limiting
//!
//! Explicit, injected fixed-window rate limiter keyed by client identity.
//! Two backends: in-memory for a single-process deployment, and Postgres
//! (atomic check-and-increment against `rate_limit_buckets`) when multiple
//! instances may run concurrently. No process-global mutable state.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, DurationRound, Utc};
use sqlx::PgPool;

/// Rate limiter errors
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Which backend to construct from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiterBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for RateLimiterBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(RateLimiterBackend::Memory),
            "postgres" => Ok(RateLimiterBackend::Postgres),
            other => Err(format!("unknown rate limiter backend: {}", other)),
        }
    }
}

/// Injected rate limiter, enum-dispatched over its backends
#[derive(Debug)]
pub enum RateLimiter {
    Memory(MemoryRateLimiter),
    Postgres(PgRateLimiter),
}

impl RateLimiter {
    pub fn new(backend: RateLimiterBackend, pool: PgPool, limit_per_minute: i32) -> Self {
        match backend {
            RateLimiterBackend::Memory => {
                RateLimiter::Memory(MemoryRateLimiter::new(limit_per_minute))
            }
            RateLimiterBackend::Postgres => {
                RateLimiter::Postgres(PgRateLimiter::new(pool, limit_per_minute))
            }
        }
    }

    /// Record one request for `client_key`; returns whether it is allowed
    pub async fn check_and_increment(&self, client_key: &str) -> Result<bool, RateLimitError> {
        match self {
            RateLimiter::Memory(limiter) => Ok(limiter.check_and_increment(client_key)),
            RateLimiter::Postgres(limiter) => limiter.check_and_increment(client_key).await,
        }
    }

    /// Drop windows older than the retention horizon; returns rows removed
    pub async fn cleanup_expired(&self) -> Result<u64, RateLimitError> {
        match self {
            RateLimiter::Memory(limiter) => Ok(limiter.cleanup_expired()),
            RateLimiter::Postgres(limiter) => limiter.cleanup_expired().await,
        }
    }
}

/// Fixed-window limiter held in process memory
#[derive(Debug)]
pub struct MemoryRateLimiter {
    limit_per_minute: i32,
    windows: Mutex<HashMap<String, (DateTime<Utc>, i32)>>,
}

impl MemoryRateLimiter {
    pub fn new(limit_per_minute: i32) -> Self {
        Self {
            limit_per_minute,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn check_and_increment(&self, client_key: &str) -> bool {
        self.check_and_increment_at(client_key, Utc::now())
    }

    fn check_and_increment_at(&self, client_key: &str, now: DateTime<Utc>) -> bool {
        let window_start = now
            .duration_trunc(chrono::Duration::minutes(1))
            .unwrap_or(now);

        let mut windows = self.windows.lock().unwrap();
        let entry = windows
            .entry(client_key.to_string())
            .or_insert((window_start, 0));

        if entry.0 != window_start {
            *entry = (window_start, 0);
        }
        entry.1 += 1;

        entry.1 <= self.limit_per_minute
    }

    pub fn cleanup_expired(&self) -> u64 {
        self.cleanup_expired_at(Utc::now())
    }

    fn cleanup_expired_at(&self, now: DateTime<Utc>) -> u64 {
        let horizon = now - chrono::Duration::minutes(2);
        let mut windows = self.windows.lock().unwrap();
        let before = windows.len();
        windows.retain(|_, (window_start, _)| *window_start >= horizon);
        (before - windows.len()) as u64
    }
}

/// Fixed-window limiter backed by the shared `rate_limit_buckets` table
#[derive(Debug)]
pub struct PgRateLimiter {
    pool: PgPool,
    limit_per_minute: i32,
}

impl PgRateLimiter {
    pub fn new(pool: PgPool, limit_per_minute: i32) -> Self {
        Self {
            pool,
            limit_per_minute,
        }
    }

    pub async fn check_and_increment(&self, client_key: &str) -> Result<bool, RateLimitError> {
        let allowed: bool = sqlx::query_scalar(r#"SELECT check_and_increment_rate_limit($1, $2)"#)
            .bind(client_key)
            .bind(self.limit_per_minute)
            .fetch_one(&self.pool)
            .await?;

        Ok(allowed)
    }

    pub async fn cleanup_expired(&self) -> Result<u64, RateLimitError> {
        let result = sqlx::query(
            r#"
            DELETE FROM rate_limit_buckets
            WHERE window_start < NOW() - INTERVAL '2 minutes'
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
