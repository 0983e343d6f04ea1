use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::{DecisionKind, DecisionStatus, Side};
use crate::db::{decimal_column, optional_decimal_column, parsed_column};

/// Database row for copy_trade_decisions.
#[derive(Debug, Clone, Serialize)]
pub struct CopyTradeDecision {
    pub id: i64,
    pub config_id: i64,
    pub wallet_id: i64,
    pub decision: DecisionKind,
    pub confidence: Decimal,
    pub market_title: String,
    pub outcome: String,
    pub action: Side,
    pub price: Decimal,
    pub size_usdc: Decimal,
    pub stop_loss_price: Option<Decimal>,
    pub reasoning: String,
    pub reasoning_en: String,
    pub risk_notes: Vec<String>,
    pub status: DecisionStatus,
    pub realized_pnl: Option<Decimal>,
    pub close_price: Option<Decimal>,
    pub executed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CopyTradeDecision {
    /// True while the decision holds an open copied position.
    pub fn is_open_position(&self) -> bool {
        self.decision == DecisionKind::Copy && self.status == DecisionStatus::Executed
    }
}

impl<'r> FromRow<'r, SqliteRow> for CopyTradeDecision {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let risk_notes_raw: String = row.try_get("risk_notes")?;
        let risk_notes: Vec<String> =
            serde_json::from_str(&risk_notes_raw).map_err(|e| sqlx::Error::ColumnDecode {
                index: "risk_notes".into(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            config_id: row.try_get("config_id")?,
            wallet_id: row.try_get("wallet_id")?,
            decision: parsed_column(row, "decision")?,
            confidence: decimal_column(row, "confidence")?,
            market_title: row.try_get("market_title")?,
            outcome: row.try_get("outcome")?,
            action: parsed_column(row, "action")?,
            price: decimal_column(row, "price")?,
            size_usdc: decimal_column(row, "size_usdc")?,
            stop_loss_price: optional_decimal_column(row, "stop_loss_price")?,
            reasoning: row.try_get("reasoning")?,
            reasoning_en: row.try_get("reasoning_en")?,
            risk_notes,
            status: parsed_column(row, "status")?,
            realized_pnl: optional_decimal_column(row, "realized_pnl")?,
            close_price: optional_decimal_column(row, "close_price")?,
            executed_at: row.try_get("executed_at")?,
            closed_at: row.try_get("closed_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A decision as emitted by the signal generator, before it is appended.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDecision {
    pub config_id: i64,
    pub decision: DecisionKind,
    pub confidence: Decimal,
    #[serde(default)]
    pub market_title: String,
    #[serde(default)]
    pub outcome: String,
    pub action: Side,
    pub price: Decimal,
    #[serde(default)]
    pub size_usdc: Decimal,
    #[serde(default)]
    pub stop_loss_price: Option<Decimal>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub reasoning_en: String,
    #[serde(default)]
    pub risk_notes: Vec<String>,
    /// Initial status for copy decisions: `pending` (default) or `executed`
    /// when the fill already happened. Ignored for skips.
    #[serde(default)]
    pub status: Option<DecisionStatus>,
}
