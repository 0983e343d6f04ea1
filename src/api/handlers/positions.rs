use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::dto::{
    self, ApiResponse, ClosePositionRequest, DecisionDto, DecisionPageDto, LimitQuery, PageQuery,
};
use crate::engine::ledger;
use crate::errors::AppError;
use crate::identity::AccountKey;
use crate::AppState;

/// GET /api/copy-trading/configs/{wallet_id}/decisions?page=&page_size=
pub async fn list_decisions(
    State(state): State<AppState>,
    account: AccountKey,
    Path(wallet_id): Path<i64>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ApiResponse<DecisionPageDto>>, AppError> {
    let page = ledger::list_decisions(&state.db, &account, wallet_id, q.page, q.page_size).await?;
    Ok(Json(ApiResponse::ok(page.into())))
}

/// GET /api/copy-trading/decisions/recent?limit=
pub async fn recent_decisions(
    State(state): State<AppState>,
    account: AccountKey,
    Query(q): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<DecisionDto>>>, AppError> {
    let recent = ledger::recent_decisions(&state.db, &account, q.limit).await?;
    Ok(Json(ApiResponse::ok(dto::decisions(recent))))
}

/// GET /api/copy-trading/positions: open copied positions
pub async fn list_open(
    State(state): State<AppState>,
    account: AccountKey,
) -> Result<Json<ApiResponse<Vec<DecisionDto>>>, AppError> {
    let open = ledger::list_open_positions(&state.db, &account).await?;
    Ok(Json(ApiResponse::ok(dto::decisions(open))))
}

/// POST /api/copy-trading/positions/{id}/close
pub async fn close(
    State(state): State<AppState>,
    account: AccountKey,
    Path(id): Path<i64>,
    Json(body): Json<ClosePositionRequest>,
) -> Result<Json<ApiResponse<DecisionDto>>, AppError> {
    let closed = ledger::close_position(&state.db, &account, id, body.exit_price).await?;
    Ok(Json(ApiResponse::ok(closed.into())))
}
