//! Idempotency Guard
//!
//! Pure per-agent decision logic: given an agent's effective timezone, its
//! current daily-state row, and the zones due in this invocation, decide
//! whether the agent must be rolled over, skipped, or left alone. The job
//! may be invoked repeatedly within the same local day; this guard is what
//! keeps every agent at exactly one rollover per local calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use super::error::ResetError;
use super::store::DailyStateRow;

/// An agent's timezone resolved once: the stored profile value, or the
/// configured default when the profile has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveTimezone {
    pub zone: Tz,
    /// True when the zone came from the profile rather than the default
    pub stored: bool,
}

impl EffectiveTimezone {
    /// Resolve a profile's optional timezone against the default zone.
    /// A stored value that is not a valid IANA name is an error; the
    /// caller records it per-agent and moves on.
    pub fn resolve(stored: Option<&str>, default_zone: Tz) -> Result<Self, ResetError> {
        match stored {
            Some(name) => Ok(Self {
                zone: name
                    .parse()
                    .map_err(|_| ResetError::InvalidTimezone(name.to_string()))?,
                stored: true,
            }),
            None => Ok(Self {
                zone: default_zone,
                stored: false,
            }),
        }
    }

    /// The calendar date of `now` rendered in this timezone
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.zone).date_naive()
    }
}

/// Guard verdict for one agent within one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// State already carries today's rollover; count as skipped
    AlreadyReset,
    /// The agent's stored zone is not in this invocation's window
    ZoneNotDue,
    /// Proceed to the reset executor
    Due,
}

/// Apply the two-layer guard for one agent.
///
/// Layer one: skip when the current state row is already stamped for the
/// agent's local date and `reset_at`'s UTC calendar date matches either the
/// invocation's UTC date or the local date. Layer two: an agent with a
/// concrete stored zone is skipped when that zone's midnight has not
/// arrived in this window; default-zone agents bypass the zone check.
pub fn decide(
    effective: &EffectiveTimezone,
    state: Option<&DailyStateRow>,
    now: DateTime<Utc>,
    due_zones: &[Tz],
) -> GuardOutcome {
    let local_date = effective.local_date(now);

    if let Some(state) = state {
        if state.local_date == local_date {
            if let Some(reset_at) = state.reset_at {
                let reset_utc_date = reset_at.date_naive();
                if reset_utc_date == now.date_naive() || reset_utc_date == local_date {
                    return GuardOutcome::AlreadyReset;
                }
            }
        }
    }

    if effective.stored && !due_zones.contains(&effective.zone) {
        return GuardOutcome::ZoneNotDue;
    }

    GuardOutcome::Due
}
