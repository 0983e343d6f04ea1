//! Signal-generator surface. Mounted behind the bearer token.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::dto::{
    ApiResponse, CopyActiveDto, DecisionDto, ExpireRequest, MarkOutcomeDto, MarkPriceRequest,
};
use crate::engine::{config_store, ledger};
use crate::errors::AppError;
use crate::models::NewDecision;
use crate::AppState;

/// GET /api/internal/configs/{id}/active: whether new decisions are accepted
pub async fn copy_active(
    State(state): State<AppState>,
    Path(config_id): Path<i64>,
) -> Result<Json<ApiResponse<CopyActiveDto>>, AppError> {
    let active = config_store::is_copy_active(&state.db, config_id).await?;
    Ok(Json(ApiResponse::ok(CopyActiveDto { config_id, active })))
}

/// POST /api/internal/decisions
pub async fn record(
    State(state): State<AppState>,
    Json(body): Json<NewDecision>,
) -> Result<(StatusCode, Json<ApiResponse<DecisionDto>>), AppError> {
    let decision = ledger::record_decision(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(decision.into()))))
}

/// POST /api/internal/decisions/{id}/execute
pub async fn execute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DecisionDto>>, AppError> {
    let decision = ledger::mark_executed(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(decision.into())))
}

/// POST /api/internal/decisions/{id}/expire
pub async fn expire(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ExpireRequest>,
) -> Result<Json<ApiResponse<DecisionDto>>, AppError> {
    let decision = ledger::mark_expired(&state.db, id, body.settlement_price).await?;
    Ok(Json(ApiResponse::ok(decision.into())))
}

/// POST /api/internal/decisions/{id}/mark: stop-loss check at a mark price
pub async fn mark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<MarkPriceRequest>,
) -> Result<Json<ApiResponse<MarkOutcomeDto>>, AppError> {
    let closed = ledger::apply_mark_price(&state.db, id, body.mark_price).await?;

    Ok(Json(ApiResponse::ok(MarkOutcomeDto {
        triggered: closed.is_some(),
        decision: closed.map(DecisionDto::from),
    })))
}
