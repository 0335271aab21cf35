use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::{
    dto::supplier_dto::{
        parse_country_param, require_country_param, CreateSupplierPayload, DedupParams,
        DeleteSupplierPayload, MutationResponse, SupplierListParams, SupplierListResponse,
        UpdateSupplierPayload,
    },
    error::Result,
    models::user::{Role, SessionUser},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/suppliers",
    params(
        ("country" = Option<String>, Query, description = "Filter by country"),
        ("search" = Option<String>, Query, description = "Free-text search"),
        ("status" = Option<String>, Query, description = "Filter by record status"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Paginated supplier records"))
)]
#[axum::debug_handler]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(params): Query<SupplierListParams>,
) -> Result<impl IntoResponse> {
    let query = params.into_query()?;
    let list = state.supplier_service.list(&user, query).await?;
    Ok(Json(SupplierListResponse::from(list)))
}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    request_body = CreateSupplierPayload,
    responses(
        (status = 201, description = "Record created"),
        (status = 202, description = "High-priority lead parked for approval"),
        (status = 403, description = "Country not granted")
    )
)]
#[axum::debug_handler]
pub async fn create_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<CreateSupplierPayload>,
) -> Result<impl IntoResponse> {
    let record = payload.record;
    let country = require_country_param(
        payload
            .country
            .as_deref()
            .or(record.country_raw().as_deref()),
    )?;

    // High-priority leads from non-admins go through the approval queue, as do
    // all operator submissions.
    if user.role == Role::Operator || (record.is_high_priority() && user.role != Role::Admin) {
        let item = state
            .approval_service
            .submit(record, Some(country), &user)
            .await?;
        return Ok((
            StatusCode::ACCEPTED,
            Json(json!({"status": "pending_approval", "approval": item})),
        )
            .into_response());
    }

    let stored = state.supplier_service.create(&user, record, country).await?;
    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

#[utoipa::path(
    patch,
    path = "/api/suppliers",
    request_body = UpdateSupplierPayload,
    responses(
        (status = 200, description = "Rows updated"),
        (status = 403, description = "No modify rights on a matched row"),
        (status = 404, description = "No row matched the identity")
    )
)]
#[axum::debug_handler]
pub async fn update_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<UpdateSupplierPayload>,
) -> Result<impl IntoResponse> {
    let reference = payload.old.into_ref()?;
    let affected = state
        .supplier_service
        .update(&user, reference, payload.record)
        .await?;
    Ok(Json(MutationResponse {
        success: true,
        affected,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/suppliers",
    request_body = DeleteSupplierPayload,
    responses(
        (status = 200, description = "Rows deleted"),
        (status = 403, description = "No modify rights on a matched row"),
        (status = 404, description = "No row matched the identity")
    )
)]
#[axum::debug_handler]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<DeleteSupplierPayload>,
) -> Result<impl IntoResponse> {
    let reference = payload.old.into_ref()?;
    let affected = state.supplier_service.delete(&user, reference).await?;
    Ok(Json(MutationResponse {
        success: true,
        affected,
    }))
}

#[utoipa::path(
    post,
    path = "/api/suppliers/dedup",
    params(("country" = Option<String>, Query, description = "Scope to one country")),
    responses((status = 200, description = "Dedup report"))
)]
#[axum::debug_handler]
pub async fn dedup_suppliers(
    State(state): State<AppState>,
    Query(params): Query<DedupParams>,
) -> Result<impl IntoResponse> {
    let country = parse_country_param(params.country.as_deref())?;
    let report = state.supplier_service.dedup(country).await?;
    Ok(Json(report))
}
