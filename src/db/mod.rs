pub mod config_repo;
pub mod decision_repo;
pub mod run_repo;

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the pool, verify connectivity and bring the schema up to date.
///
/// An in-memory database lives only as long as its connection, so it gets a
/// single connection that is never recycled.
pub async fn init_pool(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

// ---------------------------------------------------------------------------
// Column decoding helpers for TEXT-encoded decimals and enums
// ---------------------------------------------------------------------------

fn parse_column<T>(name: &str, raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: name.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn parsed_column<T>(row: &SqliteRow, name: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(name)?;
    parse_column(name, &raw)
}

pub(crate) fn decimal_column(row: &SqliteRow, name: &str) -> Result<Decimal, sqlx::Error> {
    parsed_column(row, name)
}

pub(crate) fn optional_decimal_column(
    row: &SqliteRow,
    name: &str,
) -> Result<Option<Decimal>, sqlx::Error> {
    let raw: Option<String> = row.try_get(name)?;
    raw.map(|r| parse_column(name, &r)).transpose()
}
