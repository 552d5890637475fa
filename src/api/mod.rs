//! API module
//!
//! HTTP API endpoints and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::ratelimit::RateLimiter;

pub mod middleware;
pub mod routes;

pub use routes::create_router;

/// Shared state for handlers and middleware
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let limiter = RateLimiter::new(
            config.rate_limiter_backend,
            pool.clone(),
            config.rate_limit_per_minute,
        );

        Self {
            pool,
            config: Arc::new(config),
            limiter: Arc::new(limiter),
        }
    }
}
