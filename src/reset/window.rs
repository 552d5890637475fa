//! Timezone Midnight Table and Window Selector
//!
//! Decides which supported timezones are "at local midnight" for a given
//! invocation instant. The supported-zone registry carries each zone's
//! standard-time UTC hour of midnight for reference, but matching uses the
//! zone's true current UTC offset so a zone is never stranded by a
//! daylight-saving shift.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// Supported timezones with their standard-time UTC hour of local midnight.
///
/// The hour column documents the winter offset; `midnight_utc_hour` computes
/// the live value per invocation.
pub const SUPPORTED_ZONES: &[(Tz, u32)] = &[
    (chrono_tz::America::Puerto_Rico, 4),
    (chrono_tz::America::New_York, 5),
    (chrono_tz::America::Chicago, 6),
    (chrono_tz::America::Denver, 7),
    (chrono_tz::America::Phoenix, 7),
    (chrono_tz::America::Los_Angeles, 8),
    (chrono_tz::America::Anchorage, 9),
    (chrono_tz::Pacific::Honolulu, 10),
    (chrono_tz::UTC, 0),
];

/// Default zone set for the window selector
pub fn default_zones() -> Vec<Tz> {
    SUPPORTED_ZONES.iter().map(|(zone, _)| *zone).collect()
}

/// Compute the UTC hour at which the zone's current local day began.
///
/// Uses the zone's true offset at the invocation instant rather than a
/// static table, so DST transitions shift the result with the zone. On a
/// spring-forward day where 00:00 does not exist locally, the first valid
/// wall-clock hour of the date is used instead.
pub fn midnight_utc_hour(zone: Tz, now: DateTime<Utc>) -> u32 {
    use chrono::TimeZone;

    let local_date = now.with_timezone(&zone).date_naive();
    for hour in 0..3u32 {
        let wall = match local_date.and_hms_opt(hour, 0, 0) {
            Some(t) => t,
            None => continue,
        };
        if let Some(dt) = zone.from_local_datetime(&wall).earliest() {
            return dt.with_timezone(&Utc).hour();
        }
    }

    // No IANA zone skips more than two hours at a transition
    0
}

/// Select the zones whose local midnight falls in the current window.
///
/// A zone with midnight UTC hour `m` is due when the invocation hour `h`
/// equals `m` or `m - 1` (mod 24). The one-hour-early band absorbs scheduler
/// jitter; the hour *after* a zone's midnight never matches, so a missed
/// window stays missed until the next local day.
pub fn select_due_zones(now: DateTime<Utc>, zones: &[Tz]) -> Vec<Tz> {
    let utc_hour = now.hour();
    zones
        .iter()
        .copied()
        .filter(|zone| {
            let midnight = midnight_utc_hour(*zone, now);
            midnight == utc_hour || midnight == (utc_hour + 1) % 24
        })
        .collect()
}
