use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{error::Result, AppState};

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses((status = 200, description = "Record, approval and user counts"))
)]
#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let (by_country, by_status) = state.supplier_service.stats().await?;
    let pending_approvals = state.approval_service.pending_count().await;
    let users = state.user_service.count().await?;

    Ok(Json(json!({
        "suppliers_by_country": by_country,
        "suppliers_by_status": by_status,
        "pending_approvals": pending_approvals,
        "users": users,
    })))
}
