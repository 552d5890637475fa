//! Scheduled Jobs
//!
//! Optional in-process scheduler for deployments without an external cron.
//! Ticks the daily reset job on an hourly interval and prunes expired rate
//! limit buckets. The HTTP trigger remains the primary invocation path;
//! the reset job's idempotency guard makes double-triggering harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use sqlx::PgPool;
use tokio::time::interval;

use crate::ratelimit::RateLimiter;
use crate::reset::{PgResetStore, ResetRunner, RunOutcome};

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval between reset-job ticks (default: 1 hour)
    pub reset_interval: Duration,
    /// Interval for rate limit bucket cleanup (default: 1 minute)
    pub rate_limit_cleanup_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            reset_interval: Duration::from_secs(3600),
            rate_limit_cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    pool: PgPool,
    limiter: Arc<RateLimiter>,
    default_zone: Tz,
    zones: Vec<Tz>,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a new job scheduler
    pub fn new(pool: PgPool, limiter: Arc<RateLimiter>, default_zone: Tz, zones: Vec<Tz>) -> Self {
        Self {
            pool,
            limiter,
            default_zone,
            zones,
            config: JobSchedulerConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(mut self, config: JobSchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!("Job scheduler started");

        let mut reset_interval = interval(self.config.reset_interval);
        let mut cleanup_interval = interval(self.config.rate_limit_cleanup_interval);

        loop {
            tokio::select! {
                _ = reset_interval.tick() => {
                    self.tick_reset().await;
                }
                _ = cleanup_interval.tick() => {
                    match self.limiter.cleanup_expired().await {
                        Ok(removed) if removed > 0 => {
                            tracing::info!(removed = removed, "Cleaned up expired rate limit buckets");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "Rate limit cleanup failed");
                        }
                    }
                }
            }
        }
    }

    /// One scheduled invocation of the daily reset job
    async fn tick_reset(&self) {
        let runner = ResetRunner::new(
            PgResetStore::new(self.pool.clone()),
            self.default_zone,
            self.zones.clone(),
        );

        match runner.run(Utc::now()).await {
            Ok(RunOutcome::Completed(report)) => {
                tracing::info!(
                    reset_count = report.reset_count,
                    skipped_count = report.skipped_count,
                    error_count = report.errors.len(),
                    "Scheduled daily reset run completed"
                );
            }
            Ok(RunOutcome::NoZonesDue { utc_hour }) => {
                tracing::debug!(utc_hour = utc_hour, "Scheduled reset tick: no zones due");
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled daily reset run failed");
            }
        }
    }
}
