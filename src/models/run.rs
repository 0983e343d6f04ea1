use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::UnknownVariant;
use crate::db::parsed_column;

/// Job name the copy-trade scanner records its runs under.
pub const SCANNER_JOB_NAME: &str = "copy_trade_syncer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Done,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Done => "done",
            RunStatus::Failed => "failed",
        }
    }
}

impl FromStr for RunStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "done" => Ok(RunStatus::Done),
            // older scanner builds wrote "error"
            "failed" | "error" => Ok(RunStatus::Failed),
            _ => Err(UnknownVariant {
                kind: "run status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters the scanner accumulates during one run. Missing keys read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStats {
    pub wallets_checked: i64,
    pub trades_found: i64,
    pub new_trades: i64,
    pub decisions_copy: i64,
    pub decisions_skip: i64,
    pub errors: i64,
}

/// Database row for job_runs. Written by the scanner, read by the monitor.
#[derive(Debug, Clone, Serialize)]
pub struct JobRun {
    pub id: i64,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub stats: RunStats,
    pub error_text: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for JobRun {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let stats_raw: String = row.try_get("stats")?;
        let stats = serde_json::from_str(&stats_raw).map_err(|e| sqlx::Error::ColumnDecode {
            index: "stats".into(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            job_name: row.try_get("job_name")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            status: parsed_column(row, "status")?,
            stats,
            error_text: row.try_get("error_text")?,
        })
    }
}
