use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{ConfigSettings, CopyTradingConfig};

/// Create the config for (account, wallet) or re-enable and overwrite the
/// existing one in place.
pub async fn upsert_config(
    pool: &SqlitePool,
    account: &str,
    wallet_id: i64,
    settings: &ConfigSettings,
) -> anyhow::Result<CopyTradingConfig> {
    let config = sqlx::query_as::<_, CopyTradingConfig>(
        r#"
        INSERT INTO copy_trading_configs
            (account, wallet_id, enabled, max_position_usdc, risk_preference, created_at, updated_at)
        VALUES (?1, ?2, 1, ?3, ?4, ?5, ?5)
        ON CONFLICT (account, wallet_id) DO UPDATE
            SET enabled = 1,
                max_position_usdc = excluded.max_position_usdc,
                risk_preference = excluded.risk_preference,
                updated_at = excluded.updated_at
        RETURNING *
        "#,
    )
    .bind(account)
    .bind(wallet_id)
    .bind(settings.max_position_usdc.to_string())
    .bind(settings.risk_preference.as_str())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(config)
}

/// Overwrite position cap and risk preference. Leaves `enabled` untouched.
/// Returns `None` when no config exists.
pub async fn update_settings(
    pool: &SqlitePool,
    account: &str,
    wallet_id: i64,
    settings: &ConfigSettings,
) -> anyhow::Result<Option<CopyTradingConfig>> {
    let config = sqlx::query_as::<_, CopyTradingConfig>(
        r#"
        UPDATE copy_trading_configs
        SET max_position_usdc = ?3, risk_preference = ?4, updated_at = ?5
        WHERE account = ?1 AND wallet_id = ?2
        RETURNING *
        "#,
    )
    .bind(account)
    .bind(wallet_id)
    .bind(settings.max_position_usdc.to_string())
    .bind(settings.risk_preference.as_str())
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(config)
}

/// Set enabled = false. Returns the number of rows touched (0 or 1).
pub async fn disable_config(
    pool: &SqlitePool,
    account: &str,
    wallet_id: i64,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE copy_trading_configs
        SET enabled = 0, updated_at = ?3
        WHERE account = ?1 AND wallet_id = ?2
        "#,
    )
    .bind(account)
    .bind(wallet_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn get_config(
    pool: &SqlitePool,
    account: &str,
    wallet_id: i64,
) -> anyhow::Result<Option<CopyTradingConfig>> {
    let config = sqlx::query_as::<_, CopyTradingConfig>(
        "SELECT * FROM copy_trading_configs WHERE account = ?1 AND wallet_id = ?2",
    )
    .bind(account)
    .bind(wallet_id)
    .fetch_optional(pool)
    .await?;

    Ok(config)
}

pub async fn get_config_by_id(
    pool: &SqlitePool,
    id: i64,
) -> anyhow::Result<Option<CopyTradingConfig>> {
    let config = sqlx::query_as::<_, CopyTradingConfig>(
        "SELECT * FROM copy_trading_configs WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(config)
}

/// All configs for an account, newest first.
pub async fn list_configs_by_account(
    pool: &SqlitePool,
    account: &str,
) -> anyhow::Result<Vec<CopyTradingConfig>> {
    let configs = sqlx::query_as::<_, CopyTradingConfig>(
        "SELECT * FROM copy_trading_configs WHERE account = ?1 ORDER BY created_at DESC, id DESC",
    )
    .bind(account)
    .fetch_all(pool)
    .await?;

    Ok(configs)
}

/// Count enabled configs across all accounts.
pub async fn count_enabled_configs(pool: &SqlitePool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM copy_trading_configs WHERE enabled = 1")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}
