use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{config_repo, decision_repo};
use crate::engine::config_store::ConfigView;
use crate::errors::AppError;
use crate::identity::AccountKey;
use crate::models::{CopyTradeDecision, CopyTradingConfig, DecisionKind, DecisionStatus};

/// Number of decisions included in the dashboard feed.
pub const RECENT_DECISIONS_LIMIT: usize = 10;

/// Live figures attached to a single config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PositionStats {
    pub total_pnl: Decimal,
    pub open_positions: i64,
    pub total_copies: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_pnl: Decimal,
    pub win_rate: Decimal,
    pub total_copies: i64,
    pub total_skipped: i64,
    pub open_positions: i64,
    pub active_configs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub configs: Vec<ConfigView>,
    pub recent_decisions: Vec<CopyTradeDecision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPerfPoint {
    pub date: NaiveDate,
    pub pnl: Decimal,
    pub copies: i64,
}

/// Running P&L over the daily points, as drawn by the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativeSeries {
    pub running_totals: Vec<Decimal>,
    /// Sign of the last running total; zero and empty count as positive.
    pub is_positive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub config_id: i64,
    pub total_pnl: Decimal,
    pub win_rate: Decimal,
    pub total_copies: i64,
    pub daily_points: Vec<DailyPerfPoint>,
    pub cumulative: CumulativeSeries,
}

// ---------------------------------------------------------------------------
// Pure derivations
// ---------------------------------------------------------------------------

fn is_stopped(d: &CopyTradeDecision) -> bool {
    d.status == DecisionStatus::Stopped
}

fn stopped_pnl(d: &CopyTradeDecision) -> Decimal {
    if is_stopped(d) {
        d.realized_pnl.unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

/// Profitable stopped decisions over all stopped decisions; 0 when none.
pub fn win_rate<'a>(decisions: impl IntoIterator<Item = &'a CopyTradeDecision>) -> Decimal {
    let (wins, stopped) = decisions
        .into_iter()
        .filter(|d| is_stopped(d))
        .fold((0i64, 0i64), |(wins, stopped), d| {
            let won = d.realized_pnl.is_some_and(|p| p > Decimal::ZERO);
            (wins + i64::from(won), stopped + 1)
        });

    if stopped == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(wins) / Decimal::from(stopped)
    }
}

pub fn position_stats<'a>(
    decisions: impl IntoIterator<Item = &'a CopyTradeDecision>,
) -> PositionStats {
    decisions
        .into_iter()
        .fold(PositionStats::default(), |mut acc, d| {
            acc.total_pnl = acc.total_pnl.saturating_add(stopped_pnl(d));
            if d.decision == DecisionKind::Copy {
                acc.total_copies += 1;
            }
            if d.is_open_position() {
                acc.open_positions += 1;
            }
            acc
        })
}

pub fn dashboard_stats(
    configs: &[CopyTradingConfig],
    decisions: &[CopyTradeDecision],
) -> DashboardStats {
    let totals = position_stats(decisions);
    let total_skipped = decisions
        .iter()
        .filter(|d| d.decision == DecisionKind::Skip)
        .count() as i64;

    DashboardStats {
        total_pnl: totals.total_pnl,
        win_rate: win_rate(decisions),
        total_copies: totals.total_copies,
        total_skipped,
        open_positions: totals.open_positions,
        active_configs: configs.iter().filter(|c| c.enabled).count() as i64,
    }
}

/// One point per UTC day that has any decision activity, oldest first.
/// Copies count on the day the decision was created; P&L lands on the day
/// the position was closed.
pub fn daily_points(decisions: &[CopyTradeDecision]) -> Vec<DailyPerfPoint> {
    let mut days: BTreeMap<NaiveDate, (Decimal, i64)> = BTreeMap::new();

    for d in decisions {
        let created = days.entry(d.created_at.date_naive()).or_default();
        if d.decision == DecisionKind::Copy {
            created.1 += 1;
        }

        if let (true, Some(closed_at), Some(pnl)) = (is_stopped(d), d.closed_at, d.realized_pnl) {
            let day = days.entry(closed_at.date_naive()).or_default();
            day.0 = day.0.saturating_add(pnl);
        }
    }

    days.into_iter()
        .map(|(date, (pnl, copies))| DailyPerfPoint { date, pnl, copies })
        .collect()
}

pub fn cumulative(points: &[DailyPerfPoint]) -> CumulativeSeries {
    let mut running = Decimal::ZERO;
    let running_totals: Vec<Decimal> = points
        .iter()
        .map(|p| {
            running = running.saturating_add(p.pnl);
            running
        })
        .collect();

    let is_positive = running_totals
        .last()
        .map_or(true, |last| *last >= Decimal::ZERO);

    CumulativeSeries {
        running_totals,
        is_positive,
    }
}

pub fn performance(config_id: i64, decisions: &[CopyTradeDecision]) -> Performance {
    let stats = position_stats(decisions);
    let daily_points = daily_points(decisions);
    let cumulative = cumulative(&daily_points);

    Performance {
        config_id,
        total_pnl: stats.total_pnl,
        win_rate: win_rate(decisions),
        total_copies: stats.total_copies,
        daily_points,
        cumulative,
    }
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

pub async fn config_stats(pool: &SqlitePool, config_id: i64) -> anyhow::Result<PositionStats> {
    let decisions = decision_repo::list_by_config(pool, config_id).await?;
    Ok(position_stats(&decisions))
}

pub async fn dashboard(pool: &SqlitePool, account: &AccountKey) -> Result<Dashboard, AppError> {
    let configs = config_repo::list_configs_by_account(pool, account.as_str()).await?;
    let decisions = decision_repo::list_by_account(pool, account.as_str()).await?;

    let stats = dashboard_stats(&configs, &decisions);

    let mut by_config: HashMap<i64, Vec<&CopyTradeDecision>> = HashMap::new();
    for d in &decisions {
        by_config.entry(d.config_id).or_default().push(d);
    }

    let config_views = configs
        .into_iter()
        .map(|config| {
            let stats = by_config
                .get(&config.id)
                .map(|ds| position_stats(ds.iter().copied()))
                .unwrap_or_default();
            ConfigView { config, stats }
        })
        .collect();

    let recent_decisions = decisions
        .into_iter()
        .rev()
        .take(RECENT_DECISIONS_LIMIT)
        .collect();

    Ok(Dashboard {
        stats,
        configs: config_views,
        recent_decisions,
    })
}

pub async fn performance_for_config(
    pool: &SqlitePool,
    config_id: i64,
) -> Result<Performance, AppError> {
    if config_repo::get_config_by_id(pool, config_id).await?.is_none() {
        return Err(AppError::NotFound(format!("config {config_id} not found")));
    }

    let decisions = decision_repo::list_by_config(pool, config_id).await?;
    Ok(performance(config_id, &decisions))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskPreference, Side};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn decision(id: i64, kind: DecisionKind, status: DecisionStatus) -> CopyTradeDecision {
        CopyTradeDecision {
            id,
            config_id: 1,
            wallet_id: 42,
            decision: kind,
            confidence: Decimal::new(80, 2),
            market_title: "Will it rain?".into(),
            outcome: "Yes".into(),
            action: Side::Buy,
            price: Decimal::new(40, 2),
            size_usdc: Decimal::from(100),
            stop_loss_price: None,
            reasoning: String::new(),
            reasoning_en: String::new(),
            risk_notes: vec![],
            status,
            realized_pnl: None,
            close_price: None,
            executed_at: None,
            closed_at: None,
            created_at: at(1, 9),
        }
    }

    fn stopped(id: i64, pnl: Decimal, created: DateTime<Utc>, closed: DateTime<Utc>) -> CopyTradeDecision {
        CopyTradeDecision {
            realized_pnl: Some(pnl),
            created_at: created,
            closed_at: Some(closed),
            ..decision(id, DecisionKind::Copy, DecisionStatus::Stopped)
        }
    }

    fn config(id: i64, enabled: bool) -> CopyTradingConfig {
        CopyTradingConfig {
            id,
            account: "fp".into(),
            wallet_id: id,
            enabled,
            max_position_usdc: Decimal::from(1000),
            risk_preference: RiskPreference::Moderate,
            last_checked_at: None,
            created_at: at(1, 0),
            updated_at: at(1, 0),
        }
    }

    #[test]
    fn test_win_rate_zero_without_stopped() {
        let ds = vec![
            decision(1, DecisionKind::Copy, DecisionStatus::Executed),
            decision(2, DecisionKind::Skip, DecisionStatus::Skipped),
            decision(3, DecisionKind::Copy, DecisionStatus::Pending),
        ];
        assert_eq!(win_rate(&ds), Decimal::ZERO);
    }

    #[test]
    fn test_win_rate_counts_only_stopped() {
        let mut expired = decision(4, DecisionKind::Copy, DecisionStatus::Expired);
        expired.realized_pnl = Some(Decimal::from(50));
        let ds = vec![
            stopped(1, Decimal::from(10), at(1, 9), at(1, 12)),
            stopped(2, Decimal::from(-3), at(1, 9), at(1, 12)),
            stopped(3, Decimal::ZERO, at(1, 9), at(1, 12)),
            expired,
        ];
        // 1 winner out of 3 stopped; break-even is not a win
        assert_eq!(win_rate(&ds), Decimal::ONE / Decimal::from(3));
    }

    #[test]
    fn test_dashboard_stats() {
        let configs = vec![config(1, true), config(2, false), config(3, true)];
        let ds = vec![
            stopped(1, Decimal::new(7500, 2), at(1, 9), at(2, 10)),
            stopped(2, Decimal::new(-1250, 2), at(1, 9), at(2, 11)),
            decision(3, DecisionKind::Copy, DecisionStatus::Executed),
            decision(4, DecisionKind::Copy, DecisionStatus::Executed),
            decision(5, DecisionKind::Skip, DecisionStatus::Skipped),
            decision(6, DecisionKind::Copy, DecisionStatus::Pending),
        ];

        let stats = dashboard_stats(&configs, &ds);
        assert_eq!(stats.total_pnl, Decimal::new(6250, 2));
        assert_eq!(stats.win_rate, Decimal::new(5, 1));
        assert_eq!(stats.total_copies, 5);
        assert_eq!(stats.total_skipped, 1);
        assert_eq!(stats.open_positions, 2);
        assert_eq!(stats.active_configs, 2);
    }

    #[test]
    fn test_same_day_pnl_nets() {
        let ds = vec![
            stopped(1, Decimal::from(4), at(1, 9), at(1, 20)),
            stopped(2, Decimal::from(-5), at(2, 9), at(2, 10)),
            stopped(3, Decimal::from(12), at(2, 9), at(2, 15)),
        ];

        let points = daily_points(&ds);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].date, at(2, 0).date_naive());
        assert_eq!(points[1].pnl, Decimal::from(7));
        assert_eq!(points[1].copies, 2);

        let series = cumulative(&points);
        assert_eq!(
            series.running_totals[1] - series.running_totals[0],
            Decimal::from(7)
        );
    }

    #[test]
    fn test_pnl_lands_on_close_day() {
        let ds = vec![stopped(1, Decimal::from(3), at(1, 9), at(4, 9))];
        let points = daily_points(&ds);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].copies, 1);
        assert_eq!(points[0].pnl, Decimal::ZERO);
        assert_eq!(points[1].copies, 0);
        assert_eq!(points[1].pnl, Decimal::from(3));
    }

    #[test]
    fn test_skip_only_day_still_present() {
        let mut skip = decision(1, DecisionKind::Skip, DecisionStatus::Skipped);
        skip.created_at = at(5, 1);
        let points = daily_points(&[skip]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].copies, 0);
    }

    #[test]
    fn test_cumulative_consistent_with_inputs() {
        let points: Vec<DailyPerfPoint> = [3, -8, 0, 11, -2]
            .iter()
            .enumerate()
            .map(|(i, v)| DailyPerfPoint {
                date: at(i as u32 + 1, 0).date_naive(),
                pnl: Decimal::from(*v),
                copies: 1,
            })
            .collect();

        let series = cumulative(&points);
        assert_eq!(series.running_totals[0], points[0].pnl);
        for i in 1..points.len() {
            assert_eq!(
                series.running_totals[i] - series.running_totals[i - 1],
                points[i].pnl
            );
        }
        assert_eq!(*series.running_totals.last().unwrap(), Decimal::from(4));
        assert!(series.is_positive);
    }

    #[test]
    fn test_cumulative_sign() {
        let point = |pnl: i64| DailyPerfPoint {
            date: at(1, 0).date_naive(),
            pnl: Decimal::from(pnl),
            copies: 0,
        };
        assert!(cumulative(&[]).is_positive);
        assert!(cumulative(&[point(0)]).is_positive);
        assert!(!cumulative(&[point(5), point(-6)]).is_positive);
    }

    #[test]
    fn test_accumulation_keeps_precision() {
        // a thousand tiny wins must not drift
        let ds: Vec<CopyTradeDecision> = (0..1000)
            .map(|i| stopped(i, Decimal::new(1, 4), at(1, 9), at(1, 10)))
            .collect();
        let perf = performance(1, &ds);
        assert_eq!(perf.total_pnl, Decimal::new(1, 1));
        assert_eq!(perf.win_rate, Decimal::ONE);
        assert_eq!(perf.total_copies, 1000);
    }

    #[test]
    fn test_extreme_totals_saturate() {
        let ds = vec![
            stopped(1, Decimal::MAX, at(1, 9), at(1, 10)),
            stopped(2, Decimal::MAX, at(1, 9), at(2, 10)),
        ];
        let perf = performance(1, &ds);
        assert_eq!(perf.total_pnl, Decimal::MAX);
        assert_eq!(perf.cumulative.running_totals, vec![Decimal::MAX, Decimal::MAX]);
    }
}
