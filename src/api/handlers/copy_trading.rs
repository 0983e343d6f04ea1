use axum::extract::{Path, State};
use axum::Json;

use crate::api::dto::{ApiResponse, ConfigDto, DisableRequest, DisabledDto, SettingsRequest};
use crate::engine::config_store;
use crate::errors::AppError;
use crate::identity::AccountKey;
use crate::AppState;

/// POST /api/copy-trading/enable: create or re-enable a wallet config
pub async fn enable(
    State(state): State<AppState>,
    account: AccountKey,
    Json(body): Json<SettingsRequest>,
) -> Result<Json<ApiResponse<ConfigDto>>, AppError> {
    let view = config_store::enable(
        &state.db,
        &account,
        body.wallet_id,
        &body.input(),
        state.config.max_position_cap_usdc,
    )
    .await?;

    Ok(Json(ApiResponse::ok(view.into())))
}

/// POST /api/copy-trading/disable
pub async fn disable(
    State(state): State<AppState>,
    account: AccountKey,
    Json(body): Json<DisableRequest>,
) -> Result<Json<ApiResponse<DisabledDto>>, AppError> {
    config_store::disable(&state.db, &account, body.wallet_id).await?;

    Ok(Json(ApiResponse::ok(DisabledDto {
        wallet_id: body.wallet_id,
        disabled: true,
    })))
}

/// PUT /api/copy-trading/settings
pub async fn update_settings(
    State(state): State<AppState>,
    account: AccountKey,
    Json(body): Json<SettingsRequest>,
) -> Result<Json<ApiResponse<ConfigDto>>, AppError> {
    let view = config_store::update_settings(
        &state.db,
        &account,
        body.wallet_id,
        &body.input(),
        state.config.max_position_cap_usdc,
    )
    .await?;

    Ok(Json(ApiResponse::ok(view.into())))
}

/// GET /api/copy-trading/configs: newest first
pub async fn list_configs(
    State(state): State<AppState>,
    account: AccountKey,
) -> Result<Json<ApiResponse<Vec<ConfigDto>>>, AppError> {
    let views = config_store::list_by_account(&state.db, &account).await?;

    Ok(Json(ApiResponse::ok(
        views.into_iter().map(ConfigDto::from).collect(),
    )))
}

/// GET /api/copy-trading/configs/{wallet_id}
pub async fn get_config(
    State(state): State<AppState>,
    account: AccountKey,
    Path(wallet_id): Path<i64>,
) -> Result<Json<ApiResponse<ConfigDto>>, AppError> {
    let view = config_store::get(&state.db, &account, wallet_id).await?;
    Ok(Json(ApiResponse::ok(view.into())))
}
