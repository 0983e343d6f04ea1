use chrono::Utc;
use metrics::{counter, gauge};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::config_repo;
use crate::db::decision_repo::{self, StatusUpdate};
use crate::errors::AppError;
use crate::identity::AccountKey;
use crate::models::{
    CopyTradeDecision, CopyTradingConfig, DecisionKind, DecisionStatus, NewDecision, Side,
    Transition, TransitionError,
};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 200;
pub const DEFAULT_RECENT_LIMIT: i64 = 10;
pub const MAX_RECENT_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct DecisionPage {
    pub decisions: Vec<CopyTradeDecision>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

// ---------------------------------------------------------------------------
// Pure rules
// ---------------------------------------------------------------------------

/// P&L of closing `decision` at `exit_price`: price move times shares held,
/// negated for sells. `None` when the figure does not fit in a `Decimal`.
pub fn realized_pnl(decision: &CopyTradeDecision, exit_price: Decimal) -> Option<Decimal> {
    let shares = decision.size_usdc.checked_div(decision.price)?;
    let pnl = exit_price.checked_sub(decision.price)?.checked_mul(shares)?;
    Some(match decision.action {
        Side::Buy => pnl,
        Side::Sell => -pnl,
    })
}

fn checked_pnl(decision: &CopyTradeDecision, exit_price: Decimal) -> Result<Decimal, AppError> {
    realized_pnl(decision, exit_price).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "P&L for decision {} at price {exit_price} is out of range",
            decision.id
        ))
    })
}

/// Whether `mark_price` has crossed the decision's stop-loss.
pub fn stop_loss_triggered(decision: &CopyTradeDecision, mark_price: Decimal) -> bool {
    match (decision.stop_loss_price, decision.action) {
        (Some(stop), Side::Buy) => mark_price <= stop,
        (Some(stop), Side::Sell) => mark_price >= stop,
        (None, _) => false,
    }
}

/// Validate a decision against its config and normalize it for storage.
/// Returns the initial status.
pub fn prepare_decision(
    new: &mut NewDecision,
    config: &CopyTradingConfig,
) -> Result<DecisionStatus, AppError> {
    if !config.enabled {
        return Err(AppError::InvalidState(format!(
            "copy trading is disabled for config {}",
            config.id
        )));
    }
    if new.confidence < Decimal::ZERO || new.confidence > Decimal::ONE {
        return Err(AppError::InvalidInput(format!(
            "confidence must be within [0, 1], got {}",
            new.confidence
        )));
    }
    if new.price <= Decimal::ZERO {
        return Err(AppError::InvalidInput(format!(
            "price must be greater than zero, got {}",
            new.price
        )));
    }
    if new.size_usdc < Decimal::ZERO {
        return Err(AppError::InvalidInput(format!(
            "size_usdc must not be negative, got {}",
            new.size_usdc
        )));
    }

    match new.decision {
        DecisionKind::Skip => {
            new.size_usdc = Decimal::ZERO;
            new.stop_loss_price = None;
            Ok(DecisionStatus::Skipped)
        }
        DecisionKind::Copy => {
            if new.size_usdc > config.max_position_usdc {
                return Err(AppError::InvalidInput(format!(
                    "size_usdc {} exceeds max position {}",
                    new.size_usdc, config.max_position_usdc
                )));
            }
            if let Some(stop) = new.stop_loss_price {
                if stop <= Decimal::ZERO {
                    return Err(AppError::InvalidInput(
                        "stop_loss_price must be greater than zero".into(),
                    ));
                }
            }
            match new.status.unwrap_or(DecisionStatus::Pending) {
                status @ (DecisionStatus::Pending | DecisionStatus::Executed) => Ok(status),
                other => Err(AppError::InvalidInput(format!(
                    "a copy decision cannot start in status {other}"
                ))),
            }
        }
    }
}

pub fn clamp_page(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.filter(|p| *p > 0).unwrap_or(1);
    let page_size = page_size
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    (page, page_size)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Append a decision produced by the signal generator.
pub async fn record_decision(
    pool: &SqlitePool,
    mut new: NewDecision,
) -> Result<CopyTradeDecision, AppError> {
    let config = config_repo::get_config_by_id(pool, new.config_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("config {} not found", new.config_id)))?;

    let status = prepare_decision(&mut new, &config)?;
    let decision =
        decision_repo::insert_decision(pool, &new, config.wallet_id, status, Utc::now()).await?;

    counter!("decisions_recorded_total", "decision" => decision.decision.as_str()).increment(1);
    if decision.is_open_position() {
        gauge!("open_positions").increment(1.0);
    }

    tracing::info!(
        decision_id = decision.id,
        config_id = decision.config_id,
        decision = %decision.decision,
        status = %decision.status,
        action = %decision.action,
        size_usdc = %decision.size_usdc,
        price = %decision.price,
        "Decision recorded"
    );

    Ok(decision)
}

/// Compare-and-set from the status we read to the one the transition table
/// allows. A lost race surfaces as the state error against the fresh status.
async fn transition(
    pool: &SqlitePool,
    current: &CopyTradeDecision,
    t: Transition,
    mut update: StatusUpdate,
) -> Result<CopyTradeDecision, AppError> {
    update.status = current.status.apply(t)?;

    if let Some(updated) = decision_repo::apply_transition(pool, current.id, current.status, &update).await? {
        return Ok(updated);
    }

    counter!("transition_conflicts_total", "transition" => t.to_string()).increment(1);
    let from = decision_repo::get_decision(pool, current.id)
        .await?
        .map_or(current.status, |d| d.status);

    tracing::warn!(
        decision_id = current.id,
        transition = %t,
        status = %from,
        "Concurrent transition lost the race"
    );

    Err(TransitionError { from, transition: t }.into())
}

fn empty_update() -> StatusUpdate {
    StatusUpdate {
        status: DecisionStatus::Pending,
        executed_at: None,
        closed_at: None,
        close_price: None,
        realized_pnl: None,
    }
}

async fn load(pool: &SqlitePool, id: i64) -> Result<CopyTradeDecision, AppError> {
    decision_repo::get_decision(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("decision {id} not found")))
}

/// pending -> executed.
pub async fn mark_executed(pool: &SqlitePool, id: i64) -> Result<CopyTradeDecision, AppError> {
    let current = load(pool, id).await?;
    let updated = transition(
        pool,
        &current,
        Transition::Execute,
        StatusUpdate {
            executed_at: Some(Utc::now()),
            ..empty_update()
        },
    )
    .await?;

    if updated.is_open_position() {
        gauge!("open_positions").increment(1.0);
    }
    tracing::info!(decision_id = id, "Decision executed");

    Ok(updated)
}

async fn close_at(
    pool: &SqlitePool,
    current: &CopyTradeDecision,
    exit_price: Decimal,
    reason: &'static str,
) -> Result<CopyTradeDecision, AppError> {
    let pnl = checked_pnl(current, exit_price)?;
    let closed = transition(
        pool,
        current,
        Transition::Close,
        StatusUpdate {
            closed_at: Some(Utc::now()),
            close_price: Some(exit_price),
            realized_pnl: Some(pnl),
            ..empty_update()
        },
    )
    .await?;

    counter!("positions_closed_total", "reason" => reason).increment(1);
    gauge!("open_positions").decrement(1.0);

    tracing::info!(
        decision_id = closed.id,
        config_id = closed.config_id,
        entry = %closed.price,
        exit = %exit_price,
        realized_pnl = %pnl,
        reason,
        "Position closed"
    );

    Ok(closed)
}

/// User-initiated close of an executed copy. The account must own the
/// decision; otherwise it is reported as missing.
pub async fn close_position(
    pool: &SqlitePool,
    account: &AccountKey,
    id: i64,
    exit_price: Option<Decimal>,
) -> Result<CopyTradeDecision, AppError> {
    let current = decision_repo::get_decision_for_account(pool, account.as_str(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("decision {id} not found")))?;

    // Report the state conflict before worrying about price.
    current.status.apply(Transition::Close)?;

    let exit_price = exit_price
        .filter(|p| *p > Decimal::ZERO)
        .ok_or(AppError::PriceUnavailable(id))?;

    close_at(pool, &current, exit_price, "manual").await
}

/// Expire a decision. Pending decisions expire without P&L; executed ones
/// book P&L at `settlement_price` when one is given, otherwise zero.
pub async fn mark_expired(
    pool: &SqlitePool,
    id: i64,
    settlement_price: Option<Decimal>,
) -> Result<CopyTradeDecision, AppError> {
    let current = load(pool, id).await?;
    expire(pool, &current, settlement_price).await
}

pub(crate) async fn expire(
    pool: &SqlitePool,
    current: &CopyTradeDecision,
    settlement_price: Option<Decimal>,
) -> Result<CopyTradeDecision, AppError> {
    let was_open = current.is_open_position();

    let update = if was_open {
        let settlement = settlement_price.filter(|p| *p > Decimal::ZERO);
        let pnl = match settlement {
            Some(p) => checked_pnl(current, p)?,
            None => Decimal::ZERO,
        };
        StatusUpdate {
            closed_at: Some(Utc::now()),
            close_price: settlement,
            realized_pnl: Some(pnl),
            ..empty_update()
        }
    } else {
        empty_update()
    };

    let expired = transition(pool, current, Transition::Expire, update).await?;

    counter!("decisions_expired_total").increment(1);
    if was_open {
        gauge!("open_positions").decrement(1.0);
    }

    tracing::info!(
        decision_id = expired.id,
        from = %current.status,
        realized_pnl = ?expired.realized_pnl,
        "Decision expired"
    );

    Ok(expired)
}

/// Feed a mark price to an executed position. Closes it at that price when
/// the stop-loss is crossed and returns the closed decision; `None` means
/// the position stays open.
pub async fn apply_mark_price(
    pool: &SqlitePool,
    id: i64,
    mark_price: Decimal,
) -> Result<Option<CopyTradeDecision>, AppError> {
    let current = load(pool, id).await?;
    current.status.apply(Transition::Close)?;

    if mark_price <= Decimal::ZERO {
        return Err(AppError::PriceUnavailable(id));
    }

    if !stop_loss_triggered(&current, mark_price) {
        return Ok(None);
    }

    tracing::info!(
        decision_id = id,
        mark = %mark_price,
        stop = ?current.stop_loss_price,
        "Stop-loss triggered"
    );

    close_at(pool, &current, mark_price, "stop_loss").await.map(Some)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// One page of a wallet config's decisions, newest first.
pub async fn list_decisions(
    pool: &SqlitePool,
    account: &AccountKey,
    wallet_id: i64,
    page: Option<i64>,
    page_size: Option<i64>,
) -> Result<DecisionPage, AppError> {
    let config = config_repo::get_config(pool, account.as_str(), wallet_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("no copy trading config for wallet {wallet_id}"))
        })?;

    let (page, page_size) = clamp_page(page, page_size);
    let offset = (page - 1).saturating_mul(page_size);
    let (decisions, total) =
        decision_repo::list_by_config_paged(pool, config.id, page_size, offset).await?;

    Ok(DecisionPage {
        decisions,
        total,
        page,
        page_size,
    })
}

pub async fn list_open_positions(
    pool: &SqlitePool,
    account: &AccountKey,
) -> Result<Vec<CopyTradeDecision>, AppError> {
    Ok(decision_repo::list_open_by_account(pool, account.as_str()).await?)
}

/// Latest decisions across every config the account owns, newest first.
pub async fn recent_decisions(
    pool: &SqlitePool,
    account: &AccountKey,
    limit: Option<i64>,
) -> Result<Vec<CopyTradeDecision>, AppError> {
    let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, MAX_RECENT_LIMIT);
    Ok(decision_repo::list_recent_by_account(pool, account.as_str(), limit).await?)
}

/// Re-seed the open-position gauge from storage.
pub async fn sync_open_positions_gauge(pool: &SqlitePool) -> anyhow::Result<i64> {
    let open = decision_repo::count_open_positions(pool).await?;
    gauge!("open_positions").set(open as f64);
    Ok(open)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
