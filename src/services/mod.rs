pub mod approval_service;
pub mod export_service;
pub mod supplier_service;
pub mod user_service;
pub mod workbook_service;
