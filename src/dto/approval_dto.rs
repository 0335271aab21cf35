use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::approval::ApprovalStatus;
use crate::models::supplier::SupplierRecord;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitApprovalPayload {
    pub record: SupplierRecord,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalListParams {
    pub status: Option<String>,
}

impl ApprovalListParams {
    pub fn status_filter(&self) -> Result<Option<ApprovalStatus>> {
        match self.status.as_deref() {
            None => Ok(None),
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "" => Ok(None),
                "pending_approval" | "pending" => Ok(Some(ApprovalStatus::PendingApproval)),
                "approved" => Ok(Some(ApprovalStatus::Approved)),
                "rejected" => Ok(Some(ApprovalStatus::Rejected)),
                other => Err(Error::BadRequest(format!("Unknown status: {}", other))),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectPayload {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskUpdatePayload {
    pub assigned_to: Option<String>,
    pub task_status: Option<String>,
    pub notes: Option<String>,
}
