use axum::extract::{Path, State};
use axum::Json;

use crate::api::dto::{ApiResponse, DashboardDto, PerformanceDto};
use crate::db::config_repo;
use crate::engine::aggregator;
use crate::errors::AppError;
use crate::identity::AccountKey;
use crate::AppState;

/// GET /api/copy-trading/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    account: AccountKey,
) -> Result<Json<ApiResponse<DashboardDto>>, AppError> {
    let dashboard = aggregator::dashboard(&state.db, &account).await?;
    Ok(Json(ApiResponse::ok(dashboard.into())))
}

/// GET /api/copy-trading/configs/{wallet_id}/performance: daily chart series
pub async fn performance(
    State(state): State<AppState>,
    account: AccountKey,
    Path(wallet_id): Path<i64>,
) -> Result<Json<ApiResponse<PerformanceDto>>, AppError> {
    let config = config_repo::get_config(&state.db, account.as_str(), wallet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no copy trading config for wallet {wallet_id}")))?;

    let perf = aggregator::performance_for_config(&state.db, config.id).await?;
    Ok(Json(ApiResponse::ok(perf.into())))
}
