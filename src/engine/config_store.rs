use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::config_repo;
use crate::engine::aggregator::{self, PositionStats};
use crate::errors::AppError;
use crate::identity::AccountKey;
use crate::models::{ConfigSettings, CopyTradingConfig, RiskPreference};

/// A config together with figures recomputed from its decision history.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    pub config: CopyTradingConfig,
    pub stats: PositionStats,
}

/// Settings as submitted, before validation.
#[derive(Debug, Clone)]
pub struct SettingsInput {
    pub max_position_usdc: Decimal,
    pub risk_preference: String,
}

/// Check a settings submission against the position cap.
pub fn validate_settings(
    input: &SettingsInput,
    max_cap: Decimal,
) -> Result<ConfigSettings, AppError> {
    if input.max_position_usdc <= Decimal::ZERO {
        return Err(AppError::InvalidInput(
            "max_position_usdc must be greater than zero".into(),
        ));
    }
    if input.max_position_usdc > max_cap {
        return Err(AppError::InvalidInput(format!(
            "max_position_usdc must not exceed {max_cap}"
        )));
    }

    let risk_preference: RiskPreference = input.risk_preference.parse().map_err(|_| {
        AppError::InvalidInput(format!(
            "risk_preference must be conservative, moderate or aggressive, got {:?}",
            input.risk_preference
        ))
    })?;

    Ok(ConfigSettings {
        max_position_usdc: input.max_position_usdc,
        risk_preference,
    })
}

fn validate_wallet_id(wallet_id: i64) -> Result<(), AppError> {
    if wallet_id <= 0 {
        return Err(AppError::InvalidInput(format!(
            "wallet_id must be positive, got {wallet_id}"
        )));
    }
    Ok(())
}

async fn with_stats(pool: &SqlitePool, config: CopyTradingConfig) -> Result<ConfigView, AppError> {
    let stats = aggregator::config_stats(pool, config.id).await?;
    Ok(ConfigView { config, stats })
}

/// Create or re-enable the account's config for a wallet.
pub async fn enable(
    pool: &SqlitePool,
    account: &AccountKey,
    wallet_id: i64,
    input: &SettingsInput,
    max_cap: Decimal,
) -> Result<ConfigView, AppError> {
    validate_wallet_id(wallet_id)?;
    let settings = validate_settings(input, max_cap)?;

    let config = config_repo::upsert_config(pool, account.as_str(), wallet_id, &settings).await?;

    tracing::info!(
        account = %account,
        wallet_id,
        config_id = config.id,
        max_position_usdc = %config.max_position_usdc,
        risk = %config.risk_preference,
        "Copy trading enabled"
    );

    with_stats(pool, config).await
}

/// Turn copying off. Succeeds whether or not a config exists.
pub async fn disable(pool: &SqlitePool, account: &AccountKey, wallet_id: i64) -> Result<(), AppError> {
    let touched = config_repo::disable_config(pool, account.as_str(), wallet_id).await?;

    if touched == 0 {
        tracing::debug!(account = %account, wallet_id, "Disable on missing config, nothing to do");
    } else {
        tracing::info!(account = %account, wallet_id, "Copy trading disabled");
    }

    Ok(())
}

pub async fn update_settings(
    pool: &SqlitePool,
    account: &AccountKey,
    wallet_id: i64,
    input: &SettingsInput,
    max_cap: Decimal,
) -> Result<ConfigView, AppError> {
    validate_wallet_id(wallet_id)?;
    let settings = validate_settings(input, max_cap)?;

    let config = config_repo::update_settings(pool, account.as_str(), wallet_id, &settings)
        .await?
        .ok_or_else(|| not_found(wallet_id))?;

    tracing::info!(
        account = %account,
        wallet_id,
        max_position_usdc = %config.max_position_usdc,
        risk = %config.risk_preference,
        "Copy trading settings updated"
    );

    with_stats(pool, config).await
}

pub async fn get(pool: &SqlitePool, account: &AccountKey, wallet_id: i64) -> Result<ConfigView, AppError> {
    let config = config_repo::get_config(pool, account.as_str(), wallet_id)
        .await?
        .ok_or_else(|| not_found(wallet_id))?;

    with_stats(pool, config).await
}

/// Every config the account owns, newest first.
pub async fn list_by_account(pool: &SqlitePool, account: &AccountKey) -> Result<Vec<ConfigView>, AppError> {
    let configs = config_repo::list_configs_by_account(pool, account.as_str()).await?;

    let mut views = Vec::with_capacity(configs.len());
    for config in configs {
        views.push(with_stats(pool, config).await?);
    }
    Ok(views)
}

/// Whether new decisions may be recorded against this config.
pub async fn is_copy_active(pool: &SqlitePool, config_id: i64) -> anyhow::Result<bool> {
    let config = config_repo::get_config_by_id(pool, config_id).await?;
    Ok(config.is_some_and(|c| c.enabled))
}

fn not_found(wallet_id: i64) -> AppError {
    AppError::NotFound(format!("no copy trading config for wallet {wallet_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(max: i64, risk: &str) -> SettingsInput {
        SettingsInput {
            max_position_usdc: Decimal::from(max),
            risk_preference: risk.into(),
        }
    }

    #[test]
    fn test_validate_settings_ok() {
        let s = validate_settings(&input(500, " Aggressive "), Decimal::from(100_000)).unwrap();
        assert_eq!(s.max_position_usdc, Decimal::from(500));
        assert_eq!(s.risk_preference, RiskPreference::Aggressive);
    }

    #[test]
    fn test_validate_settings_rejects_non_positive() {
        let cap = Decimal::from(100_000);
        assert!(matches!(
            validate_settings(&input(0, "moderate"), cap),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_settings(&input(-10, "moderate"), cap),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_settings_cap_is_inclusive() {
        let cap = Decimal::from(1_000);
        assert!(validate_settings(&input(1_000, "moderate"), cap).is_ok());
        assert!(validate_settings(&input(1_001, "moderate"), cap).is_err());
    }

    #[test]
    fn test_validate_settings_unknown_risk() {
        assert!(matches!(
            validate_settings(&input(10, "yolo"), Decimal::from(100)),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wallet_id_must_be_positive() {
        assert!(validate_wallet_id(0).is_err());
        assert!(validate_wallet_id(-3).is_err());
        assert!(validate_wallet_id(1).is_ok());
    }
}
