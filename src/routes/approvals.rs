use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    dto::approval_dto::{
        ApprovalListParams, RejectPayload, SubmitApprovalPayload, TaskUpdatePayload,
    },
    dto::supplier_dto::parse_country_param,
    error::Result,
    models::user::SessionUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/approvals",
    request_body = SubmitApprovalPayload,
    responses((status = 201, description = "Lead parked for approval"))
)]
#[axum::debug_handler]
pub async fn submit_approval(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<SubmitApprovalPayload>,
) -> Result<impl IntoResponse> {
    let country = parse_country_param(payload.country.as_deref())?;
    let item = state
        .approval_service
        .submit(payload.record, country, &user)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    get,
    path = "/api/approvals",
    params(("status" = Option<String>, Query, description = "Filter by approval status")),
    responses((status = 200, description = "Approval items; operators see their own"))
)]
#[axum::debug_handler]
pub async fn list_approvals(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(params): Query<ApprovalListParams>,
) -> Result<impl IntoResponse> {
    let status = params.status_filter()?;
    let items = state.approval_service.list(status, &user).await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/approvals/{id}",
    params(("id" = Uuid, Path, description = "Approval item ID")),
    responses(
        (status = 200, description = "Approval item"),
        (status = 404, description = "Item not found")
    )
)]
#[axum::debug_handler]
pub async fn get_approval(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let item = state.approval_service.get(id).await?;
    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/api/approvals/{id}/approve",
    params(("id" = Uuid, Path, description = "Approval item ID")),
    responses(
        (status = 200, description = "Snapshot written to the supplier store"),
        (status = 400, description = "Item is not pending or has no country"),
        (status = 404, description = "Item not found")
    )
)]
#[axum::debug_handler]
pub async fn approve(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let item = state
        .approval_service
        .approve(id, &user, state.store.as_ref())
        .await?;
    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/api/approvals/{id}/reject",
    params(("id" = Uuid, Path, description = "Approval item ID")),
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Item rejected"),
        (status = 404, description = "Item not found")
    )
)]
#[axum::debug_handler]
pub async fn reject(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse> {
    let item = state
        .approval_service
        .reject(id, &user, payload.reason)
        .await?;
    Ok(Json(item))
}

#[utoipa::path(
    patch,
    path = "/api/approvals/{id}/task",
    params(("id" = Uuid, Path, description = "Approval item ID")),
    request_body = TaskUpdatePayload,
    responses(
        (status = 200, description = "Task fields updated"),
        (status = 403, description = "Operators may only update their own items"),
        (status = 404, description = "Item not found")
    )
)]
#[axum::debug_handler]
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskUpdatePayload>,
) -> Result<impl IntoResponse> {
    let item = state
        .approval_service
        .update_task(
            id,
            &user,
            payload.assigned_to,
            payload.task_status,
            payload.notes,
        )
        .await?;
    Ok(Json(item))
}
