//! Reset job errors

use uuid::Uuid;

/// Errors raised while running the daily reset job
#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Store rejected reset for agent {0}")]
    ResetRejected(Uuid),
}
