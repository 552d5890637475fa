//! Common test utilities

use chrono_tz::Tz;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use lane_reset::ratelimit::RateLimiterBackend;
use lane_reset::Config;

pub const TEST_CRON_SECRET: &str = "test_cron_secret_123";

/// Setup test database - truncate reset-job tables for a fresh state
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query(
        "TRUNCATE TABLE agent_daily_state, agency_members, agent_profiles, rate_limit_buckets CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to clean up DB");

    pool
}

/// Test configuration with the given zone setup
pub fn test_config(default_timezone: Tz, reset_timezones: Vec<Tz>) -> Config {
    Config {
        database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
        database_max_connections: 5,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        cron_secret: TEST_CRON_SECRET.to_string(),
        default_timezone,
        reset_timezones,
        rate_limit_per_minute: 1000,
        rate_limiter_backend: RateLimiterBackend::Memory,
        internal_scheduler: false,
        scheduler_interval_secs: 3600,
    }
}

/// Seed an active agent profile with an agency membership
pub async fn seed_agent(pool: &PgPool, timezone: Option<&str>) -> Uuid {
    let agent_id = seed_agent_without_agency(pool, timezone).await;

    sqlx::query("INSERT INTO agency_members (user_id, agency_id) VALUES ($1, $2)")
        .bind(agent_id)
        .bind(Uuid::new_v4())
        .execute(pool)
        .await
        .expect("Failed to seed agency membership");

    agent_id
}

/// Seed an active agent profile with no agency membership
pub async fn seed_agent_without_agency(pool: &PgPool, timezone: Option<&str>) -> Uuid {
    let agent_id = Uuid::new_v4();

    sqlx::query("INSERT INTO agent_profiles (id, timezone, is_active) VALUES ($1, $2, true)")
        .bind(agent_id)
        .bind(timezone)
        .execute(pool)
        .await
        .expect("Failed to seed agent profile");

    agent_id
}

/// Count daily-state rows for one agent
pub async fn daily_state_rows(pool: &PgPool, agent_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM agent_daily_state WHERE agent_id = $1")
        .bind(agent_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count daily state rows")
}
