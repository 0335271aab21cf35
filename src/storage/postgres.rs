use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::domain::country::{normalize_country, Country};
use crate::domain::dedup::{self, DedupReport};
use crate::domain::matcher;
use crate::error::{Error, Result};
use crate::models::supplier::{RecordRef, StoredSupplier, SupplierRecord};
use crate::storage::SupplierStore;

/// Supplier store backed by the `suppliers_json` table: JSONB blob per record
/// plus indexed country and creator columns. Calls use the pool ad hoc; the
/// match-then-write sequences are not wrapped in transactions.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load(&self, country: Option<Country>) -> Result<Vec<StoredSupplier>> {
        let rows: Vec<SupplierRow> = match country {
            Some(country) => {
                sqlx::query_as(
                    "SELECT id, country, data FROM suppliers_json WHERE country = $1 ORDER BY id",
                )
                .bind(country.code())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT id, country, data FROM suppliers_json ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(SupplierRow::into_stored).collect())
    }
}

#[derive(FromRow)]
struct SupplierRow {
    id: i64,
    country: String,
    data: serde_json::Value,
}

impl SupplierRow {
    fn into_stored(self) -> StoredSupplier {
        let record = SupplierRecord::from_value(self.data).unwrap_or_else(|| {
            warn!(id = self.id, "non-object JSONB payload, treating as empty record");
            SupplierRecord::new()
        });
        let country = normalize_country(&self.country)
            .or_else(|| record.country())
            .unwrap_or(Country::Us);
        StoredSupplier {
            id: Some(self.id),
            country,
            record,
        }
    }
}

fn creator_uuid(record: &SupplierRecord) -> Option<Uuid> {
    record
        .created_by_id()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
}

#[async_trait]
impl SupplierStore for PgStore {
    async fn list(&self, country: Option<Country>) -> Result<Vec<StoredSupplier>> {
        self.load(country).await
    }

    async fn append(&self, country: Country, record: SupplierRecord) -> Result<StoredSupplier> {
        let created_by = creator_uuid(&record);
        let data = record.clone().into_value();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO suppliers_json (data, country, created_by_user_id)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(&data)
        .bind(country.code())
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(StoredSupplier {
            id: Some(id),
            country,
            record,
        })
    }

    async fn append_many(&self, rows: Vec<(Country, SupplierRecord)>) -> Result<u64> {
        let mut inserted = 0u64;
        for (country, record) in rows {
            let created_by = creator_uuid(&record);
            sqlx::query(
                "INSERT INTO suppliers_json (data, country, created_by_user_id) VALUES ($1, $2, $3)",
            )
            .bind(record.into_value())
            .bind(country.code())
            .bind(created_by)
            .execute(&self.pool)
            .await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn replace_all(&self, rows: Vec<(Country, SupplierRecord)>) -> Result<u64> {
        sqlx::query("DELETE FROM suppliers_json")
            .execute(&self.pool)
            .await?;
        self.append_many(rows).await
    }

    async fn update(&self, reference: &RecordRef, new_record: SupplierRecord) -> Result<u64> {
        let rows = self.load(reference.country).await?;
        let outcome = matcher::find_matches(reference, &rows)
            .ok_or_else(|| Error::NotFound("No record matched the given identity".to_string()))?;

        let mut written = 0u64;
        for position in outcome.positions {
            let target = &rows[position];
            let Some(id) = target.id else { continue };
            let mut merged = new_record.clone();
            merged.preserve_creation_from(&target.record);
            let country = merged.country().unwrap_or(target.country);
            let result = sqlx::query(
                "UPDATE suppliers_json SET data = $1, country = $2 WHERE id = $3",
            )
            .bind(merged.into_value())
            .bind(country.code())
            .bind(id)
            .execute(&self.pool)
            .await?;
            written += result.rows_affected();
        }
        Ok(written)
    }

    async fn delete(&self, reference: &RecordRef) -> Result<u64> {
        let rows = self.load(reference.country).await?;
        let outcome = matcher::find_matches(reference, &rows)
            .ok_or_else(|| Error::NotFound("No record matched the given identity".to_string()))?;

        let ids: Vec<i64> = outcome
            .positions
            .iter()
            .filter_map(|&position| rows[position].id)
            .collect();
        let result = sqlx::query("DELETE FROM suppliers_json WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn dedup(&self, country: Option<Country>) -> Result<DedupReport> {
        let rows = self.load(country).await?;
        let plan = dedup::plan(&rows);
        if !plan.drop.is_empty() {
            let ids: Vec<i64> = plan
                .drop
                .iter()
                .filter_map(|&position| rows[position].id)
                .collect();
            sqlx::query("DELETE FROM suppliers_json WHERE id = ANY($1)")
                .bind(&ids)
                .execute(&self.pool)
                .await?;
        }
        Ok(plan.report)
    }
}
