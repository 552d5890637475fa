//! Daily reset job
//!
//! Timezone-bucketed rollover of per-agent daily counters. Control flow:
//! window selector → eligible-agent resolver → per-agent idempotency guard
//! → atomic reset executor → run report.

pub mod error;
pub mod guard;
pub mod runner;
pub mod store;
pub mod window;

pub use error::ResetError;
pub use guard::{decide, EffectiveTimezone, GuardOutcome};
pub use runner::{ResetRunner, RunOutcome, RunReport};
pub use store::{PgResetStore, ResetStore};
pub use window::{default_zones, midnight_utc_hour, select_due_zones, SUPPORTED_ZONES};
