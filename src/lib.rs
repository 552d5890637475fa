//! Trucking Lane daily-reset library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod jobs;
pub mod ratelimit;
pub mod reset;

// Private modules (used only by main.rs binary)
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use reset::{ResetError, RunOutcome, RunReport};
