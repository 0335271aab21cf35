pub mod excel;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::country::Country;
use crate::domain::dedup::DedupReport;
use crate::error::Result;
use crate::models::supplier::{RecordRef, StoredSupplier, SupplierRecord};

/// Storage port for supplier records. Two implementations exist — the cached
/// Excel workbook and the Postgres JSONB table — selected by configuration.
/// Update and delete take a [`RecordRef`] because records carry no stable
/// primary key; the backend resolves the target rows with the identity matcher
/// and applies the operation to every row the winning rule matched.
#[async_trait]
pub trait SupplierStore: Send + Sync {
    /// All records, optionally scoped to one country.
    async fn list(&self, country: Option<Country>) -> Result<Vec<StoredSupplier>>;

    /// Insert one record under a country.
    async fn append(&self, country: Country, record: SupplierRecord) -> Result<StoredSupplier>;

    /// Bulk insert, used by the merge import path.
    async fn append_many(&self, rows: Vec<(Country, SupplierRecord)>) -> Result<u64>;

    /// Drop everything and insert the given rows, used by the replace import path.
    async fn replace_all(&self, rows: Vec<(Country, SupplierRecord)>) -> Result<u64>;

    /// Resolve targets via the matcher and overwrite them with `new_record`
    /// (creation stamps are carried over from each old row when the new record
    /// lacks them). Returns the number of rows written; zero matches is
    /// `Error::NotFound`.
    async fn update(&self, reference: &RecordRef, new_record: SupplierRecord) -> Result<u64>;

    /// Resolve targets via the matcher and delete them all. Zero matches is
    /// `Error::NotFound`.
    async fn delete(&self, reference: &RecordRef) -> Result<u64>;

    /// Run the deduplicator, optionally scoped to one country.
    async fn dedup(&self, country: Option<Country>) -> Result<DedupReport>;
}
