//! Nominations list: filter state, fetch coordination, row selection, bulk
//! actions, and per-row urgency, composed into one view controller.

pub mod bulk;
pub mod classify;
pub mod fetch;
pub mod filter;
pub mod selection;

use std::{num::NonZeroU32, sync::Arc};

use chrono::NaiveDate;
use shared::{
    domain::{BulkAction, NominationId, StatusKey, UserId},
    protocol::{Nomination, NominationStats},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{error::ClientError, TrackerApi};

use self::{
    bulk::{BulkActionExecutor, BulkOutcome, Confirmation, Confirmer},
    classify::{classify, RowCategory},
    fetch::{FetchCoordinator, LoadOutcome, PageResult},
    filter::{FilterCriteria, FilterState},
    selection::{all_selected, SelectionSet},
};

/// What one list fetch produces: the page and the dashboard counts, replaced
/// together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominationListing {
    pub page: PageResult<Nomination>,
    pub stats: NominationStats,
}

impl NominationListing {
    pub fn ids(&self) -> Vec<NominationId> {
        self.page.items.iter().map(|item| item.id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub nomination: Nomination,
    pub category: RowCategory,
    pub selected: bool,
}

struct ListState {
    filter: FilterState,
    selection: SelectionSet,
}

pub struct NominationListView {
    api: Arc<dyn TrackerApi>,
    state: Mutex<ListState>,
    fetch: FetchCoordinator<FilterCriteria, NominationListing>,
}

impl NominationListView {
    pub fn new(api: Arc<dyn TrackerApi>, page_size: NonZeroU32) -> Self {
        Self {
            api,
            state: Mutex::new(ListState {
                filter: FilterState::new(page_size),
                selection: SelectionSet::new(),
            }),
            fetch: FetchCoordinator::new("nominations"),
        }
    }

    pub async fn criteria(&self) -> FilterCriteria {
        self.state.lock().await.filter.criteria().clone()
    }

    /// Applies several filter changes and loads once. Changes go through
    /// [`FilterState`], so the page still rewinds when the filter moves.
    pub async fn update_filter<F>(
        &self,
        change: F,
    ) -> Result<LoadOutcome<NominationListing>, ClientError>
    where
        F: FnOnce(&mut FilterState) + Send,
    {
        change(&mut self.state.lock().await.filter);
        self.refresh().await
    }

    pub async fn set_assignee(
        &self,
        assignee: Option<UserId>,
    ) -> Result<LoadOutcome<NominationListing>, ClientError> {
        self.update_filter(|filter| filter.set_assignee(assignee))
            .await
    }

    pub async fn set_status(
        &self,
        status: Option<StatusKey>,
    ) -> Result<LoadOutcome<NominationListing>, ClientError> {
        self.update_filter(|filter| filter.set_status(status)).await
    }

    pub async fn set_page(
        &self,
        page: NonZeroU32,
    ) -> Result<LoadOutcome<NominationListing>, ClientError> {
        self.update_filter(|filter| filter.set_page(page)).await
    }

    pub async fn set_page_size(
        &self,
        page_size: NonZeroU32,
    ) -> Result<LoadOutcome<NominationListing>, ClientError> {
        self.update_filter(|filter| filter.set_page_size(page_size))
            .await
    }

    pub async fn next_page(&self) -> Result<LoadOutcome<NominationListing>, ClientError> {
        self.update_filter(FilterState::next_page).await
    }

    pub async fn previous_page(&self) -> Result<LoadOutcome<NominationListing>, ClientError> {
        self.update_filter(FilterState::previous_page).await
    }

    /// Fetches the page for the current criteria. On success the selection is
    /// narrowed to the rows that are still visible.
    pub async fn refresh(&self) -> Result<LoadOutcome<NominationListing>, ClientError> {
        let criteria = self.criteria().await;
        let api = Arc::clone(&self.api);
        let outcome = self
            .fetch
            .load(criteria, move |criteria| async move {
                fetch_listing(api.as_ref(), &criteria).await
            })
            .await?;

        if let LoadOutcome::Applied(listing) = &outcome {
            let dropped = self
                .state
                .lock()
                .await
                .selection
                .retain_visible(&listing.ids());
            if dropped > 0 {
                debug!(dropped, "selection narrowed to visible rows");
            }
        }
        Ok(outcome)
    }

    pub async fn is_loading(&self) -> bool {
        self.fetch.is_loading().await
    }

    pub async fn listing(&self) -> Option<Arc<NominationListing>> {
        self.fetch.data().await
    }

    pub async fn rows(&self, now: NaiveDate) -> Vec<ListRow> {
        let Some(listing) = self.listing().await else {
            return Vec::new();
        };
        let state = self.state.lock().await;
        listing
            .page
            .items
            .iter()
            .map(|nomination| ListRow {
                category: classify(nomination, now),
                selected: state.selection.contains(&nomination.id),
                nomination: nomination.clone(),
            })
            .collect()
    }

    async fn visible_ids(&self) -> Vec<NominationId> {
        self.listing()
            .await
            .map(|listing| listing.ids())
            .unwrap_or_default()
    }

    /// Flips a row's checkbox. Rows that are not on the loaded page cannot be
    /// selected.
    pub async fn toggle(&self, id: &NominationId) -> Result<bool, ClientError> {
        if !self.visible_ids().await.contains(id) {
            return Err(ClientError::validation(format!(
                "Nomination {id} is not on the current page"
            )));
        }
        Ok(self.state.lock().await.selection.toggle(id.clone()))
    }

    pub async fn select_all(&self) {
        let visible = self.visible_ids().await;
        self.state.lock().await.selection.select_all(&visible);
    }

    pub async fn toggle_all(&self, checked: bool) {
        let visible = self.visible_ids().await;
        self.state
            .lock()
            .await
            .selection
            .toggle_all(checked, &visible);
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.selection.clear();
    }

    pub async fn is_selected(&self, id: &NominationId) -> bool {
        self.state.lock().await.selection.contains(id)
    }

    pub async fn selected_ids(&self) -> Vec<NominationId> {
        self.state.lock().await.selection.ids()
    }

    pub async fn all_selected(&self) -> bool {
        let visible = self.visible_ids().await;
        all_selected(&self.state.lock().await.selection, &visible)
    }

    /// Runs a bulk action over the current selection and reloads on success.
    /// A failed reload after a successful action is logged, not returned.
    pub async fn apply_bulk_action(
        &self,
        action: Option<BulkAction>,
        confirmer: &dyn Confirmer,
    ) -> Result<BulkOutcome, ClientError> {
        let mut selection = self.state.lock().await.selection.clone();
        let executor = BulkActionExecutor::new(self.api.as_ref(), confirmer);
        let outcome = executor.execute(action, &mut selection).await?;

        self.state.lock().await.selection.clear();
        if matches!(outcome, BulkOutcome::Applied { .. }) {
            self.reload_after_mutation().await;
        }
        Ok(outcome)
    }

    pub async fn assign(
        &self,
        id: &NominationId,
        user_id: Option<&UserId>,
    ) -> Result<(), ClientError> {
        self.api.assign_nomination(id, user_id).await?;
        info!(nomination = %id, user = ?user_id.map(UserId::as_str), "nomination assigned");
        self.reload_after_mutation().await;
        Ok(())
    }

    /// Returns `false` when the user declined the confirmation.
    pub async fn delete(
        &self,
        id: &NominationId,
        confirmer: &dyn Confirmer,
    ) -> Result<bool, ClientError> {
        if !confirmer.confirm(&Confirmation::delete_nomination()).await {
            return Ok(false);
        }
        self.api.delete_nomination(id).await?;
        info!(nomination = %id, "nomination deleted");
        self.reload_after_mutation().await;
        Ok(true)
    }

    pub async fn send_content(&self, id: &NominationId) -> Result<String, ClientError> {
        self.api.send_content(id).await
    }

    pub async fn send_all_content(&self, id: &NominationId) -> Result<String, ClientError> {
        self.api.send_all_content(id).await
    }

    pub async fn scan_contracts(&self) -> Result<serde_json::Value, ClientError> {
        let report = self.api.scan_contracts().await?;
        self.reload_after_mutation().await;
        Ok(report)
    }

    async fn reload_after_mutation(&self) {
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "reload after mutation failed; showing previous page");
        }
    }
}

async fn fetch_listing(
    api: &dyn TrackerApi,
    criteria: &FilterCriteria,
) -> Result<NominationListing, ClientError> {
    let query = criteria.to_query();
    let (page, stats) = tokio::try_join!(api.list_nominations(&query), api.nomination_stats())?;
    Ok(NominationListing {
        page: PageResult::from_wire(page.nominations, page.total, criteria.page_size.get()),
        stats,
    })
}

#[cfg(test)]
#[path = "../tests/list_view_tests.rs"]
mod tests;
