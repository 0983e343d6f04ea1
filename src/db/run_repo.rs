//! Read side of the scanner's job-run log. Rows are written by the scanner
//! process itself; this service only reports on them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::JobRun;

/// Most recent runs for a job, newest first.
pub async fn list_recent_runs(
    pool: &SqlitePool,
    job_name: &str,
    limit: i64,
) -> anyhow::Result<Vec<JobRun>> {
    let runs = sqlx::query_as::<_, JobRun>(
        r#"
        SELECT * FROM job_runs
        WHERE job_name = ?1
        ORDER BY started_at DESC, id DESC
        LIMIT ?2
        "#,
    )
    .bind(job_name)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(runs)
}

/// Runs for a job that started at or after `since`.
pub async fn list_runs_since(
    pool: &SqlitePool,
    job_name: &str,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<JobRun>> {
    let runs = sqlx::query_as::<_, JobRun>(
        r#"
        SELECT * FROM job_runs
        WHERE job_name = ?1 AND started_at >= ?2
        ORDER BY started_at ASC, id ASC
        "#,
    )
    .bind(job_name)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(runs)
}
