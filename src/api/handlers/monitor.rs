use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;

use crate::api::dto::{ApiResponse, MonitorQuery};
use crate::engine::monitor::{self, MonitorReport};
use crate::errors::AppError;
use crate::AppState;

/// GET /api/copy-trading/monitor?hours=&limit=  (public scanner health)
pub async fn report(
    State(state): State<AppState>,
    Query(q): Query<MonitorQuery>,
) -> Result<Json<ApiResponse<MonitorReport>>, AppError> {
    let report = monitor::report(&state.db, q.hours, q.limit, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(report)))
}
