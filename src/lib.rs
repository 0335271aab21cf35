pub mod config;
pub mod database;
pub mod domain;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorageBackend;
use crate::error::Result;
use crate::services::{
    approval_service::ApprovalService, supplier_service::SupplierService,
    user_service::{PgUserRepository, UserService}, workbook_service::WorkbookService,
};
use crate::storage::{excel::ExcelStore, postgres::PgStore, SupplierStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<dyn SupplierStore>,
    pub user_service: UserService,
    pub supplier_service: SupplierService,
    pub approval_service: Arc<ApprovalService>,
    pub workbook_service: WorkbookService,
}

impl AppState {
    pub async fn new(pool: PgPool) -> Result<Self> {
        let config = crate::config::get_config();

        let excel = match config.storage_backend {
            StorageBackend::Excel => Some(Arc::new(ExcelStore::open(&config.workbook_path)?)),
            StorageBackend::Postgres => None,
        };
        let store: Arc<dyn SupplierStore> = match &excel {
            Some(excel) => excel.clone(),
            None => Arc::new(PgStore::new(pool.clone())),
        };

        let user_service = UserService::new(Arc::new(PgUserRepository::new(pool.clone())));
        let supplier_service = SupplierService::new(store.clone());
        let approval_service = Arc::new(ApprovalService::open(&config.approvals_path).await?);
        let workbook_service = WorkbookService::new(excel);

        Ok(Self {
            pool,
            store,
            user_service,
            supplier_service,
            approval_service,
            workbook_service,
        })
    }
}
