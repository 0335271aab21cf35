use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::get_config;
use crate::domain::dedup::DedupReport;
use crate::error::{Error, Result};
use crate::storage::excel::{parse_workbook_bytes, ExcelStore};
use crate::storage::SupplierStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshSource {
    Remote,
    Cache,
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    Merge,
    Replace,
}

#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub imported: u64,
    pub dedup: Option<DedupReport>,
}

/// Remote workbook retrieval and bulk workbook import. The download path
/// tries each configured URL in order, then the cached copy, then the bundled
/// seed file, then fails hard.
#[derive(Clone)]
pub struct WorkbookService {
    client: Client,
    excel: Option<Arc<ExcelStore>>,
}

impl WorkbookService {
    pub fn new(excel: Option<Arc<ExcelStore>>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self { client, excel }
    }

    pub async fn refresh(&self) -> Result<RefreshSource> {
        let source = self.replace_workbook_file().await?;
        if let Some(excel) = &self.excel {
            excel.reload().await?;
        }
        Ok(source)
    }

    async fn replace_workbook_file(&self) -> Result<RefreshSource> {
        let config = get_config();

        for url in &config.workbook_urls {
            match self.try_download(url).await {
                Ok(bytes) => {
                    write_atomic(&config.workbook_path, &bytes).await?;
                    if let Err(e) = tokio::fs::copy(&config.workbook_path, &config.workbook_cache_path).await {
                        warn!(error = %e, "could not refresh workbook cache copy");
                    }
                    info!(url, "workbook downloaded");
                    return Ok(RefreshSource::Remote);
                }
                Err(e) => {
                    warn!(url, error = %e, "workbook download failed, trying next source");
                }
            }
        }

        if tokio::fs::metadata(&config.workbook_cache_path).await.is_ok() {
            tokio::fs::copy(&config.workbook_cache_path, &config.workbook_path).await?;
            warn!("falling back to cached workbook");
            return Ok(RefreshSource::Cache);
        }

        if let Some(seed) = &config.workbook_seed_path {
            if tokio::fs::metadata(seed).await.is_ok() {
                tokio::fs::copy(seed, &config.workbook_path).await?;
                warn!("falling back to bundled seed workbook");
                return Ok(RefreshSource::Seed);
            }
        }

        Err(Error::Storage(
            "No workbook source available: downloads failed and no cache or seed file exists"
                .to_string(),
        ))
    }

    async fn try_download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::Storage(format!("Empty workbook body from {}", url)));
        }
        Ok(bytes.to_vec())
    }

    /// Parse an uploaded workbook and feed it into the active store.
    pub async fn import(
        &self,
        store: &dyn SupplierStore,
        bytes: Vec<u8>,
        mode: ImportMode,
    ) -> Result<ImportOutcome> {
        let rows = parse_workbook_bytes(bytes)?;
        if rows.is_empty() {
            return Err(Error::BadRequest(
                "Workbook contained no recognizable country sheets".to_string(),
            ));
        }
        match mode {
            ImportMode::Replace => {
                let imported = store.replace_all(rows).await?;
                Ok(ImportOutcome {
                    imported,
                    dedup: None,
                })
            }
            ImportMode::Merge => {
                let imported = store.append_many(rows).await?;
                let report = store.dedup(None).await?;
                Ok(ImportOutcome {
                    imported,
                    dedup: Some(report),
                })
            }
        }
    }
}

async fn write_atomic(path: &str, bytes: &[u8]) -> Result<()> {
    let tmp = format!("{}.tmp", path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
