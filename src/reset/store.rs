//! Reset store
//!
//! Bulk reads and the atomic per-agent rollover against the backing store.
//! The runner is generic over `ResetStore` so the guard/orchestration logic
//! can be exercised without Postgres; `PgResetStore` is the production
//! implementation.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::ResetError;

/// An agent eligible for consideration: id plus the raw stored timezone
#[derive(Debug, Clone)]
pub struct AgentCandidate {
    pub id: Uuid,
    pub timezone: Option<String>,
}

/// Agency membership link for a candidate agent
#[derive(Debug, Clone)]
pub struct AgencyMembership {
    pub user_id: Uuid,
    pub agency_id: Uuid,
}

/// Current daily-state row for an agent
#[derive(Debug, Clone)]
pub struct DailyStateRow {
    pub agent_id: Uuid,
    pub local_date: NaiveDate,
    pub reset_at: Option<DateTime<Utc>>,
}

/// Backing-store contract for the daily reset job
#[allow(async_fn_in_trait)]
pub trait ResetStore {
    /// Active profiles whose timezone is in the due set or unset
    async fn fetch_candidates(&self, zones: &[Tz]) -> Result<Vec<AgentCandidate>, ResetError>;

    /// Agency memberships for the candidate id set
    async fn fetch_memberships(
        &self,
        agent_ids: &[Uuid],
    ) -> Result<Vec<AgencyMembership>, ResetError>;

    /// Current daily-state rows for the candidate id set
    async fn fetch_daily_states(
        &self,
        agent_ids: &[Uuid],
    ) -> Result<Vec<DailyStateRow>, ResetError>;

    /// Atomic rollover for one agent: zero the counters, stamp
    /// `local_date` and `reset_at` in a single store-side transaction
    async fn reset_daily_state(
        &self,
        agent_id: Uuid,
        agency_id: Uuid,
        zone: Tz,
    ) -> Result<(), ResetError>;
}

/// Postgres-backed reset store
#[derive(Debug, Clone)]
pub struct PgResetStore {
    pool: PgPool,
}

impl PgResetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ResetStore for PgResetStore {
    async fn fetch_candidates(&self, zones: &[Tz]) -> Result<Vec<AgentCandidate>, ResetError> {
        let names: Vec<String> = zones.iter().map(|z| z.name().to_string()).collect();

        let rows: Vec<(Uuid, Option<String>)> = sqlx::query_as(
            r#"
            SELECT id, timezone
            FROM agent_profiles
            WHERE is_active = true
              AND (timezone = ANY($1) OR timezone IS NULL)
            "#,
        )
        .bind(&names)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, timezone)| AgentCandidate { id, timezone })
            .collect())
    }

    async fn fetch_memberships(
        &self,
        agent_ids: &[Uuid],
    ) -> Result<Vec<AgencyMembership>, ResetError> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT user_id, agency_id
            FROM agency_members
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(agent_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, agency_id)| AgencyMembership { user_id, agency_id })
            .collect())
    }

    async fn fetch_daily_states(
        &self,
        agent_ids: &[Uuid],
    ) -> Result<Vec<DailyStateRow>, ResetError> {
        let rows: Vec<(Uuid, NaiveDate, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            SELECT agent_id, local_date, reset_at
            FROM agent_daily_state
            WHERE agent_id = ANY($1)
            "#,
        )
        .bind(agent_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(agent_id, local_date, reset_at)| DailyStateRow {
                agent_id,
                local_date,
                reset_at,
            })
            .collect())
    }

    async fn reset_daily_state(
        &self,
        agent_id: Uuid,
        agency_id: Uuid,
        zone: Tz,
    ) -> Result<(), ResetError> {
        // Server-side transaction: counter rollover + timestamps in one shot
        let ok: bool = sqlx::query_scalar(r#"SELECT reset_agent_daily_state($1, $2, $3)"#)
            .bind(agent_id)
            .bind(agency_id)
            .bind(zone.name())
            .fetch_one(&self.pool)
            .await?;

        if !ok {
            return Err(ResetError::ResetRejected(agent_id));
        }

        Ok(())
    }
}
