use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::models::{CopyTradeDecision, DecisionStatus, NewDecision};

/// Column changes applied together with a status change. `None` leaves the
/// stored value as it is.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: DecisionStatus,
    pub executed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub close_price: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
}

/// Append a validated decision.
pub async fn insert_decision(
    pool: &SqlitePool,
    new: &NewDecision,
    wallet_id: i64,
    status: DecisionStatus,
    created_at: DateTime<Utc>,
) -> anyhow::Result<CopyTradeDecision> {
    let executed_at = (status == DecisionStatus::Executed).then_some(created_at);
    let risk_notes = serde_json::to_string(&new.risk_notes)?;

    let decision = sqlx::query_as::<_, CopyTradeDecision>(
        r#"
        INSERT INTO copy_trade_decisions
            (config_id, wallet_id, decision, confidence, market_title, outcome, action,
             price, size_usdc, stop_loss_price, reasoning, reasoning_en, risk_notes,
             status, executed_at, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        RETURNING *
        "#,
    )
    .bind(new.config_id)
    .bind(wallet_id)
    .bind(new.decision.as_str())
    .bind(new.confidence.to_string())
    .bind(&new.market_title)
    .bind(&new.outcome)
    .bind(new.action.as_str())
    .bind(new.price.to_string())
    .bind(new.size_usdc.to_string())
    .bind(new.stop_loss_price.map(|p| p.to_string()))
    .bind(&new.reasoning)
    .bind(&new.reasoning_en)
    .bind(risk_notes)
    .bind(status.as_str())
    .bind(executed_at)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(decision)
}

/// Guarded status change: applies `update` only while the row is still in
/// `expected`. Returns `None` when the guard did not match, which includes
/// losing a race against a concurrent transition on the same id.
pub async fn apply_transition(
    pool: &SqlitePool,
    id: i64,
    expected: DecisionStatus,
    update: &StatusUpdate,
) -> anyhow::Result<Option<CopyTradeDecision>> {
    let decision = sqlx::query_as::<_, CopyTradeDecision>(
        r#"
        UPDATE copy_trade_decisions
        SET status = ?3,
            executed_at = COALESCE(?4, executed_at),
            closed_at = COALESCE(?5, closed_at),
            close_price = COALESCE(?6, close_price),
            realized_pnl = COALESCE(?7, realized_pnl)
        WHERE id = ?1 AND status = ?2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(expected.as_str())
    .bind(update.status.as_str())
    .bind(update.executed_at)
    .bind(update.closed_at)
    .bind(update.close_price.map(|p| p.to_string()))
    .bind(update.realized_pnl.map(|p| p.to_string()))
    .fetch_optional(pool)
    .await?;

    Ok(decision)
}

pub async fn get_decision(pool: &SqlitePool, id: i64) -> anyhow::Result<Option<CopyTradeDecision>> {
    let decision = sqlx::query_as::<_, CopyTradeDecision>(
        "SELECT * FROM copy_trade_decisions WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(decision)
}

/// Fetch a decision only if it belongs to one of the account's configs.
pub async fn get_decision_for_account(
    pool: &SqlitePool,
    account: &str,
    id: i64,
) -> anyhow::Result<Option<CopyTradeDecision>> {
    let decision = sqlx::query_as::<_, CopyTradeDecision>(
        r#"
        SELECT d.*
        FROM copy_trade_decisions d
        JOIN copy_trading_configs c ON c.id = d.config_id
        WHERE d.id = ?1 AND c.account = ?2
        "#,
    )
    .bind(id)
    .bind(account)
    .fetch_optional(pool)
    .await?;

    Ok(decision)
}

/// One page of a config's decisions, newest first, plus the total count.
pub async fn list_by_config_paged(
    pool: &SqlitePool,
    config_id: i64,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(Vec<CopyTradeDecision>, i64)> {
    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM copy_trade_decisions WHERE config_id = ?1")
            .bind(config_id)
            .fetch_one(pool)
            .await?;

    let rows = sqlx::query_as::<_, CopyTradeDecision>(
        r#"
        SELECT * FROM copy_trade_decisions
        WHERE config_id = ?1
        ORDER BY created_at DESC, id DESC
        LIMIT ?2 OFFSET ?3
        "#,
    )
    .bind(config_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total.0))
}

/// Full history of a config in ledger order (oldest first).
pub async fn list_by_config(
    pool: &SqlitePool,
    config_id: i64,
) -> anyhow::Result<Vec<CopyTradeDecision>> {
    let rows = sqlx::query_as::<_, CopyTradeDecision>(
        "SELECT * FROM copy_trade_decisions WHERE config_id = ?1 ORDER BY created_at ASC, id ASC",
    )
    .bind(config_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Full history across every config the account owns, oldest first.
pub async fn list_by_account(
    pool: &SqlitePool,
    account: &str,
) -> anyhow::Result<Vec<CopyTradeDecision>> {
    let rows = sqlx::query_as::<_, CopyTradeDecision>(
        r#"
        SELECT d.*
        FROM copy_trade_decisions d
        JOIN copy_trading_configs c ON c.id = d.config_id
        WHERE c.account = ?1
        ORDER BY d.created_at ASC, d.id ASC
        "#,
    )
    .bind(account)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn list_recent_by_account(
    pool: &SqlitePool,
    account: &str,
    limit: i64,
) -> anyhow::Result<Vec<CopyTradeDecision>> {
    let rows = sqlx::query_as::<_, CopyTradeDecision>(
        r#"
        SELECT d.*
        FROM copy_trade_decisions d
        JOIN copy_trading_configs c ON c.id = d.config_id
        WHERE c.account = ?1
        ORDER BY d.created_at DESC, d.id DESC
        LIMIT ?2
        "#,
    )
    .bind(account)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Executed copy decisions for the account, newest first.
pub async fn list_open_by_account(
    pool: &SqlitePool,
    account: &str,
) -> anyhow::Result<Vec<CopyTradeDecision>> {
    let rows = sqlx::query_as::<_, CopyTradeDecision>(
        r#"
        SELECT d.*
        FROM copy_trade_decisions d
        JOIN copy_trading_configs c ON c.id = d.config_id
        WHERE c.account = ?1 AND d.decision = 'copy' AND d.status = 'executed'
        ORDER BY d.created_at DESC, d.id DESC
        "#,
    )
    .bind(account)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Pending decisions created before `cutoff`, oldest first.
pub async fn list_stale_pending(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
    limit: i64,
) -> anyhow::Result<Vec<CopyTradeDecision>> {
    let rows = sqlx::query_as::<_, CopyTradeDecision>(
        r#"
        SELECT * FROM copy_trade_decisions
        WHERE status = 'pending' AND created_at < ?1
        ORDER BY created_at ASC, id ASC
        LIMIT ?2
        "#,
    )
    .bind(cutoff)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count executed copy decisions across all accounts.
pub async fn count_open_positions(pool: &SqlitePool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM copy_trade_decisions WHERE decision = 'copy' AND status = 'executed'",
    )
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
