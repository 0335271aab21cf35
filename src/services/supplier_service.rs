use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::country::Country;
use crate::domain::dedup::DedupReport;
use crate::domain::matcher;
use crate::domain::permissions;
use crate::error::{Error, Result};
use crate::models::supplier::{RecordRef, StoredSupplier, SupplierRecord};
use crate::models::user::{Role, SessionUser};
use crate::storage::SupplierStore;
use crate::utils::time;

#[derive(Debug, Default, Clone)]
pub struct SupplierListQuery {
    pub country: Option<Country>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub struct SupplierList {
    pub items: Vec<StoredSupplier>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct SupplierService {
    store: Arc<dyn SupplierStore>,
}

impl SupplierService {
    pub fn new(store: Arc<dyn SupplierStore>) -> Self {
        Self { store }
    }

    /// Which country a request may operate on. Admins pass anything through;
    /// everyone else must hold the grant.
    pub fn resolve_country_scope(
        user: &SessionUser,
        requested: Option<Country>,
    ) -> Result<Option<Country>> {
        match requested {
            None => Ok(None),
            Some(country) => {
                if user.role == Role::Admin || user.allowed_countries.contains(&country) {
                    Ok(Some(country))
                } else {
                    Err(Error::Forbidden(format!(
                        "Country {} is not in your allowed countries",
                        country.code()
                    )))
                }
            }
        }
    }

    pub async fn list(&self, user: &SessionUser, query: SupplierListQuery) -> Result<SupplierList> {
        let scope = Self::resolve_country_scope(user, query.country)?;
        let mut rows = self.store.list(scope).await?;

        // Without an explicit country, non-admins see their granted countries
        // only (the legacy CHINA sheet stays admin-visible).
        if scope.is_none() && user.role != Role::Admin {
            rows.retain(|row| user.allowed_countries.contains(&row.country));
        }

        if let Some(needle) = query.search.as_deref() {
            let needle = needle.trim().to_lowercase();
            if !needle.is_empty() {
                rows.retain(|row| record_contains(&row.record, &needle));
            }
        }
        if let Some(status) = query.status.as_deref() {
            let status = status.trim().to_lowercase();
            rows.retain(|row| {
                row.record
                    .status()
                    .map(|s| s.trim().to_lowercase() == status)
                    .unwrap_or(false)
            });
        }

        let total = rows.len() as i64;
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 500);
        let offset = ((page - 1) * per_page) as usize;
        let items: Vec<StoredSupplier> = rows
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(SupplierList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    pub async fn create(
        &self,
        user: &SessionUser,
        mut record: SupplierRecord,
        country: Country,
    ) -> Result<StoredSupplier> {
        if user.role == Role::Operator {
            return Err(Error::Forbidden(
                "Operators submit leads through the approval workflow".to_string(),
            ));
        }
        if user.role != Role::Admin && !user.allowed_countries.contains(&country) {
            return Err(Error::Forbidden(format!(
                "Country {} is not in your allowed countries",
                country.code()
            )));
        }
        record.stamp_creation(user, country, time::now());
        self.store.append(country, record).await
    }

    pub async fn update(
        &self,
        user: &SessionUser,
        reference: RecordRef,
        new_record: SupplierRecord,
    ) -> Result<u64> {
        self.authorize_matched(user, &reference).await?;
        self.store.update(&reference, new_record).await
    }

    pub async fn delete(&self, user: &SessionUser, reference: RecordRef) -> Result<u64> {
        self.authorize_matched(user, &reference).await?;
        self.store.delete(&reference).await
    }

    /// Resolve the rows the reference identifies and require modify rights on
    /// every one of them, since the operation will hit all tied matches.
    async fn authorize_matched(&self, user: &SessionUser, reference: &RecordRef) -> Result<()> {
        let rows = self.store.list(reference.country).await?;
        let outcome = matcher::find_matches(reference, &rows)
            .ok_or_else(|| Error::NotFound("No record matched the given identity".to_string()))?;
        for position in outcome.positions {
            let row = &rows[position];
            // Excel rows often have no Country column; the sheet carries it.
            let mut record = row.record.clone();
            if record.country_raw().is_none() {
                record.set("Country", Value::String(row.country.code().to_string()));
            }
            if !permissions::can_modify(user, &record) {
                return Err(Error::Forbidden(
                    "You are not allowed to modify this record".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub async fn dedup(&self, country: Option<Country>) -> Result<DedupReport> {
        self.store.dedup(country).await
    }

    /// Per-country and per-status counts for the dashboard.
    pub async fn stats(&self) -> Result<(HashMap<String, i64>, HashMap<String, i64>)> {
        let rows = self.store.list(None).await?;
        let mut by_country: HashMap<String, i64> = HashMap::new();
        let mut by_status: HashMap<String, i64> = HashMap::new();
        for row in &rows {
            *by_country.entry(row.country.code().to_string()).or_insert(0) += 1;
            let status = row
                .record
                .status()
                .unwrap_or_else(|| "unknown".to_string())
                .to_lowercase();
            *by_status.entry(status).or_insert(0) += 1;
        }
        Ok((by_country, by_status))
    }
}

fn record_contains(record: &SupplierRecord, needle: &str) -> bool {
    record.as_map().values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        _ => false,
    })
}
