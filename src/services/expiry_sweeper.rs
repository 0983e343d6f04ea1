use chrono::{Duration as ChronoDuration, Utc};
use sqlx::SqlitePool;
use tokio::time::{interval, Duration};

use crate::db::decision_repo;
use crate::engine::ledger;
use crate::errors::AppError;

/// Upper bound on decisions expired per tick.
const SWEEP_BATCH: i64 = 500;

/// Expire pending decisions older than `horizon_secs`, once per call.
/// Returns how many were expired. Decisions that moved on concurrently are
/// skipped.
pub async fn sweep_once(pool: &SqlitePool, horizon_secs: i64) -> anyhow::Result<usize> {
    let cutoff = Utc::now() - ChronoDuration::seconds(horizon_secs);
    let stale = decision_repo::list_stale_pending(pool, cutoff, SWEEP_BATCH).await?;

    let mut expired = 0;
    for decision in &stale {
        match ledger::expire(pool, decision, None).await {
            Ok(_) => expired += 1,
            Err(AppError::InvalidState(reason)) => {
                tracing::debug!(decision_id = decision.id, %reason, "Already moved on, skipping");
            }
            Err(e) => return Err(anyhow::anyhow!("expiring decision {}: {e}", decision.id)),
        }
    }

    Ok(expired)
}

/// Run the expiry sweeper loop. Periodically moves `pending` decisions that
/// never executed to `expired`.
pub async fn run_expiry_sweeper(pool: SqlitePool, horizon_secs: i64, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    tracing::info!(horizon_secs, interval_secs, "Expiry sweeper started");

    loop {
        ticker.tick().await;

        match sweep_once(&pool, horizon_secs).await {
            Ok(0) => tracing::debug!("Expiry sweeper: nothing stale"),
            Ok(n) => tracing::info!(expired = n, "Expiry sweeper: expired stale pending decisions"),
            Err(e) => tracing::error!(error = %e, "Expiry sweeper: sweep failed"),
        }
    }
}
