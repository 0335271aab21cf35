use serde::{Deserialize, Serialize};

use crate::domain::country::{normalize_country, Country};
use crate::error::{Error, Result};
use crate::models::supplier::{RecordRef, StoredSupplier, SupplierRecord};
use crate::services::supplier_service::{SupplierList, SupplierListQuery};
use crate::services::workbook_service::ImportMode;

/// Country query/body values arrive as free text ("usa", "Mexico", "US").
pub fn parse_country_param(raw: Option<&str>) -> Result<Option<Country>> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => normalize_country(value)
            .map(Some)
            .ok_or_else(|| Error::BadRequest(format!("Unknown country: {}", value))),
    }
}

pub fn require_country_param(raw: Option<&str>) -> Result<Country> {
    parse_country_param(raw)?
        .ok_or_else(|| Error::BadRequest("A country is required".to_string()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplierListParams {
    pub country: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl SupplierListParams {
    pub fn into_query(self) -> Result<SupplierListQuery> {
        Ok(SupplierListQuery {
            country: parse_country_param(self.country.as_deref())?,
            search: self.search,
            status: self.status,
            page: self.page,
            per_page: self.per_page,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSupplierPayload {
    pub record: SupplierRecord,
    pub country: Option<String>,
}

/// The identity basis for update/delete: the client echoes back the record as
/// it last saw it, plus the row id when the Postgres backend supplied one.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordRefPayload {
    pub id: Option<i64>,
    pub country: Option<String>,
    pub record: SupplierRecord,
}

impl RecordRefPayload {
    pub fn into_ref(self) -> Result<RecordRef> {
        Ok(RecordRef {
            id: self.id,
            country: parse_country_param(self.country.as_deref())?,
            record: self.record,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSupplierPayload {
    pub old: RecordRefPayload,
    pub record: SupplierRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSupplierPayload {
    pub old: RecordRefPayload,
}

#[derive(Debug, Serialize)]
pub struct SupplierListResponse {
    pub items: Vec<StoredSupplier>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<SupplierList> for SupplierListResponse {
    fn from(list: SupplierList) -> Self {
        Self {
            items: list.items,
            total: list.total,
            page: list.page,
            per_page: list.per_page,
            total_pages: list.total_pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub affected: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupParams {
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportParams {
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportParams {
    pub mode: Option<ImportMode>,
}
