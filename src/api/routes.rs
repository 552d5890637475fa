//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::error::AppError;
use crate::reset::{PgResetStore, ResetRunner, RunOutcome};

use super::AppState;

// =========================================================================
// Response types
// =========================================================================

/// Returned when no supported zone is at local midnight
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoZonesDueResponse {
    pub message: String,
    pub utc_hour: u32,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new().route("/jobs/daily-reset", post(run_daily_reset))
}

// =========================================================================
// POST /jobs/daily-reset
// =========================================================================

/// Trigger one invocation of the daily agent-state reset job.
///
/// Safe to call repeatedly: the idempotency guard keeps every agent at one
/// rollover per local calendar day. Per-agent store failures land in the
/// report's error list with a 200; only structural failures return 500.
async fn run_daily_reset(State(state): State<AppState>) -> Result<Response, AppError> {
    let runner = ResetRunner::new(
        PgResetStore::new(state.pool.clone()),
        state.config.default_timezone,
        state.config.reset_timezones.clone(),
    );

    match runner.run(Utc::now()).await? {
        RunOutcome::NoZonesDue { utc_hour } => Ok(Json(NoZonesDueResponse {
            message: "No timezones at local midnight for this hour".to_string(),
            utc_hour,
        })
        .into_response()),
        RunOutcome::Completed(report) => Ok(Json(report).into_response()),
    }
}

// =========================================================================
// GET /health
// =========================================================================

/// Health check: verifies database connectivity
pub async fn health_check(State(state): State<AppState>) -> Result<&'static str, AppError> {
    crate::db::verify_connection(&state.pool).await?;

    Ok("OK")
}
