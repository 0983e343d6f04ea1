use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use polycopy::config::AppConfig;
use polycopy::db::decision_repo::{self, StatusUpdate};
use polycopy::db::{self, config_repo};
use polycopy::identity::AccountKey;
use polycopy::models::{
    ConfigSettings, CopyTradeDecision, CopyTradingConfig, DecisionKind, DecisionStatus, JobRun,
    NewDecision, RiskPreference, RunStats, RunStatus, Side, SCANNER_JOB_NAME,
};
use polycopy::AppState;

/// Fresh in-memory database with migrations applied. Every call is isolated.
#[allow(dead_code)]
pub async fn setup_test_db() -> SqlitePool {
    db::init_pool("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database")
}

#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        port: 0,
        ..AppConfig::default()
    }
}

#[allow(dead_code)]
pub async fn build_test_app(config: AppConfig) -> (axum::Router, SqlitePool) {
    let pool = setup_test_db().await;
    let metrics_handle = polycopy::metrics::init_metrics().expect("metrics recorder");

    let state = AppState {
        db: pool.clone(),
        config,
        metrics_handle,
    };

    (polycopy::api::router::create_router(state), pool)
}

#[allow(dead_code)]
pub fn account(key: &str) -> AccountKey {
    AccountKey::resolve(key).expect("valid account key")
}

/// Seed an enabled config for testing.
#[allow(dead_code)]
pub async fn seed_config(
    pool: &SqlitePool,
    account: &str,
    wallet_id: i64,
    max_position_usdc: i64,
) -> CopyTradingConfig {
    config_repo::upsert_config(
        pool,
        account,
        wallet_id,
        &ConfigSettings {
            max_position_usdc: Decimal::from(max_position_usdc),
            risk_preference: RiskPreference::Moderate,
        },
    )
    .await
    .expect("Failed to seed config")
}

/// A copy decision buying at `price` for `size_usdc`.
#[allow(dead_code)]
pub fn new_copy(config_id: i64, price: Decimal, size_usdc: Decimal) -> NewDecision {
    NewDecision {
        config_id,
        decision: DecisionKind::Copy,
        confidence: Decimal::new(75, 2),
        market_title: "Will BTC close above 100k?".into(),
        outcome: "Yes".into(),
        action: Side::Buy,
        price,
        size_usdc,
        stop_loss_price: None,
        reasoning: "跟单理由".into(),
        reasoning_en: "whale has 70% hit rate in this category".into(),
        risk_notes: vec!["thin book".into()],
        status: None,
    }
}

/// Insert a decision directly with an explicit creation time.
#[allow(dead_code)]
pub async fn seed_decision(
    pool: &SqlitePool,
    config: &CopyTradingConfig,
    new: &NewDecision,
    status: DecisionStatus,
    created_at: DateTime<Utc>,
) -> CopyTradeDecision {
    decision_repo::insert_decision(pool, new, config.wallet_id, status, created_at)
        .await
        .expect("Failed to seed decision")
}

/// Seed a copy decision that was executed and then closed with `pnl`.
#[allow(dead_code)]
pub async fn seed_closed(
    pool: &SqlitePool,
    config: &CopyTradingConfig,
    pnl: Decimal,
    created_at: DateTime<Utc>,
    closed_at: DateTime<Utc>,
) -> CopyTradeDecision {
    let new = new_copy(config.id, Decimal::new(50, 2), Decimal::from(100));
    let d = seed_decision(pool, config, &new, DecisionStatus::Executed, created_at).await;

    decision_repo::apply_transition(
        pool,
        d.id,
        DecisionStatus::Executed,
        &StatusUpdate {
            status: DecisionStatus::Stopped,
            executed_at: None,
            closed_at: Some(closed_at),
            close_price: Some(Decimal::new(50, 2)),
            realized_pnl: Some(pnl),
        },
    )
    .await
    .expect("Failed to close seeded decision")
    .expect("seeded decision was not executed")
}

/// Seed a scanner run; without a duration it is still running.
#[allow(dead_code)]
pub async fn seed_run(
    pool: &SqlitePool,
    started_at: DateTime<Utc>,
    duration_ms: Option<i64>,
    stats: RunStats,
) -> JobRun {
    let (status, ended_at) = match duration_ms {
        Some(ms) => (RunStatus::Done, Some(started_at + chrono::Duration::milliseconds(ms))),
        None => (RunStatus::Running, None),
    };

    sqlx::query_as::<_, JobRun>(
        r#"
        INSERT INTO job_runs (job_name, started_at, ended_at, status, stats)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING *
        "#,
    )
    .bind(SCANNER_JOB_NAME)
    .bind(started_at)
    .bind(ended_at)
    .bind(status.as_str())
    .bind(serde_json::to_string(&stats).expect("Failed to encode run stats"))
    .fetch_one(pool)
    .await
    .expect("Failed to seed run")
}
