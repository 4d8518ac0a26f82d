use async_trait::async_trait;
use shared::domain::BulkAction;
use tracing::info;

use crate::{error::ClientError, list::selection::SelectionSet, TrackerApi};

/// A yes/no question put to the user before a destructive or bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub title: String,
    pub text: String,
    pub confirm_label: String,
}

impl Confirmation {
    pub fn bulk_update(count: usize, action: BulkAction) -> Self {
        Self {
            title: "Are you sure?".to_string(),
            text: format!("Mark {count} nomination(s) as {action}?"),
            confirm_label: "Yes, update it!".to_string(),
        }
    }

    pub fn delete_nomination() -> Self {
        Self {
            title: "Are you sure?".to_string(),
            text: "This nomination will be deleted".to_string(),
            confirm_label: "Yes, delete it!".to_string(),
        }
    }

    pub fn delete_user() -> Self {
        Self {
            title: "Delete User?".to_string(),
            text: "This action cannot be undone.".to_string(),
            confirm_label: "Yes, delete".to_string(),
        }
    }
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, request: &Confirmation) -> bool;
}

/// Answers yes to everything; for non-interactive callers.
pub struct AutoConfirm;

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _request: &Confirmation) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    Applied { action: BulkAction, count: usize },
    Cancelled,
}

pub struct BulkActionExecutor<'a> {
    api: &'a dyn TrackerApi,
    confirmer: &'a dyn Confirmer,
}

impl<'a> BulkActionExecutor<'a> {
    pub fn new(api: &'a dyn TrackerApi, confirmer: &'a dyn Confirmer) -> Self {
        Self { api, confirmer }
    }

    /// Applies `action` to every selected id in one request. The selection is
    /// cleared on success and on cancel, and left intact on failure so the
    /// user can retry.
    pub async fn execute(
        &self,
        action: Option<BulkAction>,
        selection: &mut SelectionSet,
    ) -> Result<BulkOutcome, ClientError> {
        if selection.is_empty() {
            return Err(ClientError::validation("Select nominations"));
        }
        let Some(action) = action else {
            return Err(ClientError::validation("Select a bulk action"));
        };

        let ids = selection.ids();
        let prompt = Confirmation::bulk_update(ids.len(), action);
        if !self.confirmer.confirm(&prompt).await {
            selection.clear();
            return Ok(BulkOutcome::Cancelled);
        }

        self.api.bulk_update_status(&ids, action).await?;
        info!(%action, count = ids.len(), "bulk update applied");
        selection.clear();
        Ok(BulkOutcome::Applied {
            action,
            count: ids.len(),
        })
    }
}
