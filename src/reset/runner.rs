//! Reset runner
//!
//! Orchestrates one invocation of the daily reset job: window selection,
//! candidate resolution, per-agent guard, atomic rollover, and the run
//! report. Agents are processed sequentially; a single agent's store
//! failure is recorded and never aborts the batch.

use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use uuid::Uuid;

use super::error::ResetError;
use super::guard::{decide, EffectiveTimezone, GuardOutcome};
use super::store::{DailyStateRow, ResetStore};
use super::window::select_due_zones;

/// Aggregated result of one completed invocation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub message: String,
    pub timezones: Vec<String>,
    pub reset_count: u32,
    pub skipped_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub idempotent: bool,
}

/// Outcome of one invocation
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No supported zone is at local midnight; nothing was read or written
    NoZonesDue { utc_hour: u32 },
    Completed(RunReport),
}

/// Runs the daily reset job over a backing store
pub struct ResetRunner<S> {
    store: S,
    default_zone: Tz,
    zones: Vec<Tz>,
}

impl<S: ResetStore> ResetRunner<S> {
    pub fn new(store: S, default_zone: Tz, zones: Vec<Tz>) -> Self {
        Self {
            store,
            default_zone,
            zones,
        }
    }

    /// Execute one invocation at instant `now`.
    ///
    /// Bulk-read failures abort the whole run; per-agent reset failures are
    /// collected into the report's error list.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome, ResetError> {
        let due_zones = select_due_zones(now, &self.zones);
        if due_zones.is_empty() {
            tracing::info!(utc_hour = now.hour(), "No timezones due for daily reset");
            return Ok(RunOutcome::NoZonesDue {
                utc_hour: now.hour(),
            });
        }

        let zone_names: Vec<String> = due_zones.iter().map(|z| z.name().to_string()).collect();
        tracing::info!(timezones = ?zone_names, "Running daily reset");

        let candidates = self.store.fetch_candidates(&due_zones).await?;
        let agent_ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();

        let agency_by_agent: HashMap<Uuid, Uuid> = self
            .store
            .fetch_memberships(&agent_ids)
            .await?
            .into_iter()
            .map(|m| (m.user_id, m.agency_id))
            .collect();

        let state_by_agent: HashMap<Uuid, DailyStateRow> = self
            .store
            .fetch_daily_states(&agent_ids)
            .await?
            .into_iter()
            .map(|s| (s.agent_id, s))
            .collect();

        let mut reset_count: u32 = 0;
        let mut skipped_count: u32 = 0;
        let mut errors: Vec<String> = Vec::new();

        for candidate in candidates {
            let Some(&agency_id) = agency_by_agent.get(&candidate.id) else {
                tracing::info!(agent_id = %candidate.id, "Agent has no agency membership, excluded");
                continue;
            };

            let effective =
                match EffectiveTimezone::resolve(candidate.timezone.as_deref(), self.default_zone) {
                    Ok(effective) => effective,
                    Err(e) => {
                        tracing::warn!(agent_id = %candidate.id, error = %e, "Bad profile timezone");
                        errors.push(format!("{}: {}", candidate.id, e));
                        continue;
                    }
                };

            match decide(
                &effective,
                state_by_agent.get(&candidate.id),
                now,
                &due_zones,
            ) {
                GuardOutcome::AlreadyReset => {
                    tracing::debug!(agent_id = %candidate.id, "Already reset for local date, skipped");
                    skipped_count += 1;
                }
                GuardOutcome::ZoneNotDue => {
                    tracing::debug!(
                        agent_id = %candidate.id,
                        zone = effective.zone.name(),
                        "Zone not at midnight in this window, skipped"
                    );
                    skipped_count += 1;
                }
                GuardOutcome::Due => {
                    match self
                        .store
                        .reset_daily_state(candidate.id, agency_id, effective.zone)
                        .await
                    {
                        Ok(()) => reset_count += 1,
                        Err(e) => {
                            tracing::error!(agent_id = %candidate.id, error = %e, "Reset failed");
                            errors.push(format!("{}: {}", candidate.id, e));
                        }
                    }
                }
            }
        }

        tracing::info!(
            reset_count = reset_count,
            skipped_count = skipped_count,
            error_count = errors.len(),
            "Daily reset run completed"
        );

        Ok(RunOutcome::Completed(RunReport {
            message: "Daily agent reset completed".to_string(),
            timezones: zone_names,
            reset_count,
            skipped_count,
            errors,
            timestamp: now,
            idempotent: true,
        }))
    }
}
