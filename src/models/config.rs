use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::RiskPreference;
use crate::db::{decimal_column, parsed_column};

/// Database row for copy_trading_configs. One per (account, wallet_id).
#[derive(Debug, Clone, Serialize)]
pub struct CopyTradingConfig {
    pub id: i64,
    pub account: String,
    pub wallet_id: i64,
    pub enabled: bool,
    pub max_position_usdc: Decimal,
    pub risk_preference: RiskPreference,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for CopyTradingConfig {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            account: row.try_get("account")?,
            wallet_id: row.try_get("wallet_id")?,
            enabled: row.try_get("enabled")?,
            max_position_usdc: decimal_column(row, "max_position_usdc")?,
            risk_preference: parsed_column(row, "risk_preference")?,
            last_checked_at: row.try_get("last_checked_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Settings accepted by enable / update.
#[derive(Debug, Clone)]
pub struct ConfigSettings {
    pub max_position_usdc: Decimal,
    pub risk_preference: RiskPreference,
}
