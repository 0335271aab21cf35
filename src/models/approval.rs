use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::country::Country;
use crate::models::supplier::SupplierRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    PendingApproval,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub actor: String,
    pub action: String,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A high-priority lead parked for review before it reaches the supplier store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalItem {
    pub id: Uuid,
    pub status: ApprovalStatus,
    pub supplier: SupplierRecord,
    pub country: Option<Country>,
    pub created_by: Uuid,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_to: Option<String>,
    pub task_status: Option<String>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub history: Vec<HistoryEntry>,
}

impl ApprovalItem {
    pub fn log(&mut self, actor: &str, action: &str, detail: Option<String>, now: DateTime<Utc>) {
        self.history.push(HistoryEntry {
            actor: actor.to_string(),
            action: action.to_string(),
            detail,
            timestamp: now,
        });
        self.updated_at = now;
    }
}
