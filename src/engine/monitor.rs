//! Read-only reporting over the scanner's job-run log.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{config_repo, run_repo};
use crate::models::{JobRun, RunStats, RunStatus, SCANNER_JOB_NAME};

pub const DEFAULT_WINDOW_HOURS: i64 = 24;
pub const MAX_WINDOW_HOURS: i64 = 168;
pub const DEFAULT_RUN_LIMIT: i64 = 20;
pub const MAX_RUN_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyBucket {
    pub hour: DateTime<Utc>,
    pub runs: i64,
    pub wallets_checked: i64,
    pub new_trades: i64,
    pub decisions_copy: i64,
    pub decisions_skip: i64,
    pub errors: i64,
}

impl HourlyBucket {
    fn empty(hour: DateTime<Utc>) -> Self {
        Self {
            hour,
            runs: 0,
            wallets_checked: 0,
            new_trades: 0,
            decisions_copy: 0,
            decisions_skip: 0,
            errors: 0,
        }
    }

    fn add(&mut self, stats: &RunStats) {
        self.runs += 1;
        self.wallets_checked += stats.wallets_checked;
        self.new_trades += stats.new_trades;
        self.decisions_copy += stats.decisions_copy;
        self.decisions_skip += stats.decisions_skip;
        self.errors += stats.errors;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub id: i64,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub stats: RunStats,
    pub error_text: Option<String>,
}

impl From<JobRun> for RunSummary {
    fn from(run: JobRun) -> Self {
        let duration_ms = run
            .ended_at
            .map(|ended| (ended - run.started_at).num_milliseconds());

        Self {
            id: run.id,
            status: run.status,
            started_at: run.started_at,
            ended_at: run.ended_at,
            duration_ms,
            stats: run.stats,
            error_text: run.error_text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub enabled_configs: i64,
    pub hourly_stats: Vec<HourlyBucket>,
    pub recent_runs: Vec<RunSummary>,
}

pub fn clamp_window(hours: Option<i64>) -> i64 {
    hours
        .unwrap_or(DEFAULT_WINDOW_HOURS)
        .clamp(1, MAX_WINDOW_HOURS)
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_RUN_LIMIT).clamp(1, MAX_RUN_LIMIT)
}

fn hour_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    let secs = t.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(3600), 0).unwrap_or(t)
}

/// Start of the oldest bucket in a `hours`-wide window ending at `now`.
pub fn window_start(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    hour_floor(now) - Duration::hours(hours - 1)
}

/// Group runs into `hours` hourly buckets ending at the hour containing
/// `now`. Every hour gets a bucket, empty or not; newest first.
pub fn bucket_hourly(runs: &[JobRun], now: DateTime<Utc>, hours: i64) -> Vec<HourlyBucket> {
    let current = hour_floor(now);
    let mut buckets: Vec<HourlyBucket> = (0..hours)
        .map(|i| HourlyBucket::empty(current - Duration::hours(i)))
        .collect();

    for run in runs {
        let offset = (current - hour_floor(run.started_at)).num_hours();
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|i| buckets.get_mut(i)) {
            bucket.add(&run.stats);
        }
    }

    buckets
}

pub async fn hourly_stats(
    pool: &SqlitePool,
    hours: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<HourlyBucket>> {
    let runs = run_repo::list_runs_since(pool, SCANNER_JOB_NAME, window_start(now, hours)).await?;
    Ok(bucket_hourly(&runs, now, hours))
}

pub async fn recent_runs(pool: &SqlitePool, limit: i64) -> anyhow::Result<Vec<RunSummary>> {
    let runs = run_repo::list_recent_runs(pool, SCANNER_JOB_NAME, limit).await?;
    Ok(runs.into_iter().map(RunSummary::from).collect())
}

pub async fn report(
    pool: &SqlitePool,
    hours: Option<i64>,
    limit: Option<i64>,
    now: DateTime<Utc>,
) -> anyhow::Result<MonitorReport> {
    let hourly_stats = hourly_stats(pool, clamp_window(hours), now).await?;
    let recent_runs = recent_runs(pool, clamp_limit(limit)).await?;
    let enabled_configs = config_repo::count_enabled_configs(pool).await?;

    Ok(MonitorReport {
        enabled_configs,
        hourly_stats,
        recent_runs,
    })
}
