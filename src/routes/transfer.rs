use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    dto::supplier_dto::{parse_country_param, ExportParams, ImportParams},
    error::{Error, Result},
    services::export_service::ExportService,
    services::workbook_service::ImportMode,
    AppState,
};

/// Bulk upload: a multipart xlsx, sheet per country. `mode=merge` appends and
/// dedups, `mode=replace` swaps the whole store contents.
#[utoipa::path(
    post,
    path = "/api/suppliers/import",
    params(("mode" = Option<String>, Query, description = "merge (default) or replace")),
    responses(
        (status = 200, description = "Import report"),
        (status = 400, description = "No file or no recognizable sheets")
    )
)]
#[axum::debug_handler]
pub async fn import_suppliers(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mode = params.mode.unwrap_or(ImportMode::Merge);

    let mut bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            bytes = Some(field.bytes().await?.to_vec());
            break;
        }
    }
    let bytes = bytes.ok_or_else(|| Error::BadRequest("Missing 'file' field".to_string()))?;

    let outcome = state
        .workbook_service
        .import(state.store.as_ref(), bytes, mode)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/suppliers/export",
    params(("country" = Option<String>, Query, description = "Scope to one country")),
    responses((status = 200, description = "XLSX workbook attachment"))
)]
#[axum::debug_handler]
pub async fn export_suppliers(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse> {
    let country = parse_country_param(params.country.as_deref())?;
    let rows = state.store.list(country).await?;
    let buffer = ExportService::generate_suppliers_xlsx(&rows)?;

    let filename = format!(
        "suppliers_{}_{}.xlsx",
        country.map(|c| c.code().to_lowercase()).unwrap_or_else(|| "all".to_string()),
        chrono::Utc::now().format("%Y%m%d")
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}

/// Re-fetch the workbook from the configured remote sources.
#[utoipa::path(
    post,
    path = "/api/suppliers/refresh",
    responses(
        (status = 200, description = "Workbook refreshed, body names the source used"),
        (status = 500, description = "All sources failed")
    )
)]
#[axum::debug_handler]
pub async fn refresh_workbook(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let source = state.workbook_service.refresh().await?;
    Ok(Json(json!({"success": true, "source": source})))
}
