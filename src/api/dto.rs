//! Wire shapes for the HTTP API. Money and ratios go out as fixed-point
//! strings; everything upstream keeps full `Decimal` precision.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::engine::aggregator::{Dashboard, DailyPerfPoint, Performance};
use crate::engine::config_store::{ConfigView, SettingsInput};
use crate::engine::ledger::DecisionPage;
use crate::models::{CopyTradeDecision, DecisionKind, DecisionStatus, RiskPreference, Side};

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// USDC amounts: two decimals, half away from zero.
pub fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn ratio(value: Decimal) -> String {
    format!(
        "{:.4}",
        value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    )
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub wallet_id: i64,
    pub max_position_usdc: Decimal,
    pub risk_preference: String,
}

impl SettingsRequest {
    pub fn input(&self) -> SettingsInput {
        SettingsInput {
            max_position_usdc: self.max_position_usdc,
            risk_preference: self.risk_preference.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DisableRequest {
    pub wallet_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClosePositionRequest {
    pub exit_price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpireRequest {
    pub settlement_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct MarkPriceRequest {
    pub mark_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MonitorQuery {
    pub hours: Option<i64>,
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ConfigDto {
    pub id: i64,
    pub wallet_id: i64,
    pub enabled: bool,
    pub max_position_usdc: String,
    pub risk_preference: RiskPreference,
    pub total_pnl: String,
    pub open_positions: i64,
    pub total_copies: i64,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConfigView> for ConfigDto {
    fn from(view: ConfigView) -> Self {
        let ConfigView { config, stats } = view;
        Self {
            id: config.id,
            wallet_id: config.wallet_id,
            enabled: config.enabled,
            max_position_usdc: money(config.max_position_usdc),
            risk_preference: config.risk_preference,
            total_pnl: money(stats.total_pnl),
            open_positions: stats.open_positions,
            total_copies: stats.total_copies,
            last_checked_at: config.last_checked_at,
            created_at: config.created_at,
            updated_at: config.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DisabledDto {
    pub wallet_id: i64,
    pub disabled: bool,
}

#[derive(Debug, Serialize)]
pub struct CopyActiveDto {
    pub config_id: i64,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct DecisionDto {
    pub id: i64,
    pub config_id: i64,
    pub wallet_id: i64,
    pub decision: DecisionKind,
    pub confidence: String,
    pub market_title: String,
    pub outcome: String,
    pub action: Side,
    pub price: String,
    pub size_usdc: String,
    pub stop_loss_price: Option<String>,
    pub reasoning: String,
    pub reasoning_en: String,
    pub risk_notes: Vec<String>,
    pub status: DecisionStatus,
    pub realized_pnl: Option<String>,
    pub close_price: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CopyTradeDecision> for DecisionDto {
    fn from(d: CopyTradeDecision) -> Self {
        Self {
            id: d.id,
            config_id: d.config_id,
            wallet_id: d.wallet_id,
            decision: d.decision,
            confidence: ratio(d.confidence),
            market_title: d.market_title,
            outcome: d.outcome,
            action: d.action,
            // prices are probabilities, not money
            price: d.price.normalize().to_string(),
            size_usdc: money(d.size_usdc),
            stop_loss_price: d.stop_loss_price.map(|p| p.normalize().to_string()),
            reasoning: d.reasoning,
            reasoning_en: d.reasoning_en,
            risk_notes: d.risk_notes,
            status: d.status,
            realized_pnl: d.realized_pnl.map(money),
            close_price: d.close_price.map(|p| p.normalize().to_string()),
            executed_at: d.executed_at,
            closed_at: d.closed_at,
            created_at: d.created_at,
        }
    }
}

pub fn decisions(ds: Vec<CopyTradeDecision>) -> Vec<DecisionDto> {
    ds.into_iter().map(DecisionDto::from).collect()
}

#[derive(Debug, Serialize)]
pub struct DecisionPageDto {
    pub decisions: Vec<DecisionDto>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl From<DecisionPage> for DecisionPageDto {
    fn from(p: DecisionPage) -> Self {
        Self {
            decisions: decisions(p.decisions),
            total: p.total,
            page: p.page,
            page_size: p.page_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkOutcomeDto {
    pub triggered: bool,
    pub decision: Option<DecisionDto>,
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub total_pnl: String,
    pub win_rate: String,
    pub total_copies: i64,
    pub total_skipped: i64,
    pub open_positions: i64,
    pub active_configs: i64,
    pub configs: Vec<ConfigDto>,
    pub recent_decisions: Vec<DecisionDto>,
}

impl From<Dashboard> for DashboardDto {
    fn from(d: Dashboard) -> Self {
        Self {
            total_pnl: money(d.stats.total_pnl),
            win_rate: ratio(d.stats.win_rate),
            total_copies: d.stats.total_copies,
            total_skipped: d.stats.total_skipped,
            open_positions: d.stats.open_positions,
            active_configs: d.stats.active_configs,
            configs: d.configs.into_iter().map(ConfigDto::from).collect(),
            recent_decisions: decisions(d.recent_decisions),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyPointDto {
    pub date: NaiveDate,
    pub pnl: String,
    pub cumulative_pnl: String,
    pub copies: i64,
}

#[derive(Debug, Serialize)]
pub struct PerformanceDto {
    pub config_id: i64,
    pub total_pnl: String,
    pub win_rate: String,
    pub total_copies: i64,
    pub is_positive: bool,
    pub daily_points: Vec<DailyPointDto>,
}

impl From<Performance> for PerformanceDto {
    fn from(p: Performance) -> Self {
        let daily_points = p
            .daily_points
            .iter()
            .zip(&p.cumulative.running_totals)
            .map(|(point, running): (&DailyPerfPoint, &Decimal)| DailyPointDto {
                date: point.date,
                pnl: money(point.pnl),
                cumulative_pnl: money(*running),
                copies: point.copies,
            })
            .collect();

        Self {
            config_id: p.config_id,
            total_pnl: money(p.total_pnl),
            win_rate: ratio(p.win_rate),
            total_copies: p.total_copies,
            is_positive: p.cumulative.is_positive,
            daily_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_rounds_half_away_from_zero() {
        assert_eq!(money(Decimal::new(75, 0)), "75.00");
        assert_eq!(money(Decimal::new(12345, 3)), "12.35");
        assert_eq!(money(Decimal::new(-12345, 3)), "-12.35");
        assert_eq!(money(Decimal::new(1, 4)), "0.00");
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(Decimal::ONE / Decimal::from(3)), "0.3333");
        assert_eq!(ratio(Decimal::ZERO), "0.0000");
    }
}
