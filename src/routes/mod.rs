pub mod approvals;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod suppliers;
pub mod transfer;
pub mod users;
