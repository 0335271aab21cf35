use std::path::PathBuf;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::domain::country::Country;
use crate::error::{Error, Result};
use crate::models::approval::{ApprovalItem, ApprovalStatus};
use crate::models::supplier::SupplierRecord;
use crate::models::user::{Role, SessionUser};
use crate::storage::SupplierStore;
use crate::utils::time;

/// Approval queue for high-priority leads. Local JSON store: load on
/// construct, save on every mutation.
pub struct ApprovalService {
    path: PathBuf,
    items: RwLock<Vec<ApprovalItem>>,
}

impl ApprovalService {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            let raw = tokio::fs::read(&path).await?;
            serde_json::from_slice(&raw)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    async fn save(&self, items: &[ApprovalItem]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let raw = serde_json::to_vec_pretty(items)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    pub async fn submit(
        &self,
        supplier: SupplierRecord,
        country: Option<Country>,
        user: &SessionUser,
    ) -> Result<ApprovalItem> {
        let now = time::now();
        let country = country.or_else(|| supplier.country());
        let mut item = ApprovalItem {
            id: Uuid::new_v4(),
            status: ApprovalStatus::PendingApproval,
            supplier,
            country,
            created_by: user.id,
            created_by_name: user.name.clone(),
            created_at: now,
            updated_at: now,
            assigned_to: None,
            task_status: None,
            notes: None,
            rejection_reason: None,
            history: Vec::new(),
        };
        item.log(&user.name, "submitted", None, now);

        let mut items = self.items.write().await;
        items.push(item.clone());
        self.save(&items).await?;
        Ok(item)
    }

    /// Operators only see their own submissions; managers and admins see all.
    pub async fn list(
        &self,
        status: Option<ApprovalStatus>,
        viewer: &SessionUser,
    ) -> Result<Vec<ApprovalItem>> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|item| status.map(|s| item.status == s).unwrap_or(true))
            .filter(|item| viewer.role != Role::Operator || item.created_by == viewer.id)
            .cloned()
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<ApprovalItem> {
        let items = self.items.read().await;
        items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Approval item not found".to_string()))
    }

    /// Approve: write the embedded snapshot into the supplier store, then mark
    /// the item.
    pub async fn approve(
        &self,
        id: Uuid,
        actor: &SessionUser,
        store: &dyn SupplierStore,
    ) -> Result<ApprovalItem> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::NotFound("Approval item not found".to_string()))?;
        if item.status != ApprovalStatus::PendingApproval {
            return Err(Error::BadRequest(
                "Only pending items can be approved".to_string(),
            ));
        }
        let country = item
            .country
            .or_else(|| item.supplier.country())
            .ok_or_else(|| {
                Error::BadRequest("Approval item has no resolvable country".to_string())
            })?;

        let mut record = item.supplier.clone();
        if record.created_at_raw().is_none() {
            record.stamp_creation(actor, country, time::now());
        }
        store.append(country, record).await?;

        let now = time::now();
        item.status = ApprovalStatus::Approved;
        item.log(&actor.name, "approved", None, now);
        let snapshot = item.clone();
        info!(id = %id, actor = %actor.email, "approval accepted");
        self.save(&items).await?;
        Ok(snapshot)
    }

    pub async fn reject(
        &self,
        id: Uuid,
        actor: &SessionUser,
        reason: Option<String>,
    ) -> Result<ApprovalItem> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::NotFound("Approval item not found".to_string()))?;
        if item.status != ApprovalStatus::PendingApproval {
            return Err(Error::BadRequest(
                "Only pending items can be rejected".to_string(),
            ));
        }
        let now = time::now();
        item.status = ApprovalStatus::Rejected;
        item.rejection_reason = reason.clone();
        item.log(&actor.name, "rejected", reason, now);
        let snapshot = item.clone();
        self.save(&items).await?;
        Ok(snapshot)
    }

    pub async fn update_task(
        &self,
        id: Uuid,
        actor: &SessionUser,
        assigned_to: Option<String>,
        task_status: Option<String>,
        notes: Option<String>,
    ) -> Result<ApprovalItem> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::NotFound("Approval item not found".to_string()))?;

        // Operators only touch tasks on their own submissions.
        if actor.role == Role::Operator && item.created_by != actor.id {
            return Err(Error::Forbidden(
                "Operators can only update their own submissions".to_string(),
            ));
        }

        if let Some(assigned) = assigned_to {
            item.assigned_to = Some(assigned);
        }
        if let Some(status) = task_status {
            item.task_status = Some(status);
        }
        if let Some(text) = notes {
            item.notes = Some(text);
        }
        let now = time::now();
        item.log(&actor.name, "task_updated", None, now);
        let snapshot = item.clone();
        self.save(&items).await?;
        Ok(snapshot)
    }

    pub async fn pending_count(&self) -> usize {
        let items = self.items.read().await;
        items
            .iter()
            .filter(|item| item.status == ApprovalStatus::PendingApproval)
            .count()
    }
}
