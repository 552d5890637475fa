//! Database module
//!
//! Database connection and schema verification utilities.

use sqlx::PgPool;

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if required tables and functions exist
/// Note: We use raw SQL files in migrations/ directory
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = vec![
        "agent_profiles",
        "agency_members",
        "agent_daily_state",
        "rate_limit_buckets",
    ];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    let required_functions = vec!["reset_agent_daily_state", "check_and_increment_rate_limit"];

    for function in required_functions {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM pg_proc WHERE proname = $1)"#)
                .bind(function)
                .fetch_one(pool)
                .await?;

        if !exists {
            tracing::error!(
                "Required function '{}' does not exist. Please run migrations.",
                function
            );
            return Ok(false);
        }
    }

    Ok(true)
}
