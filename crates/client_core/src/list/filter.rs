use std::num::NonZeroU32;

use shared::{
    domain::{StatusKey, UserId},
    protocol::ListNominationsQuery,
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

pub fn default_page_size() -> NonZeroU32 {
    NonZeroU32::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU32::MIN)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub assignee: Option<UserId>,
    pub status: Option<StatusKey>,
    pub page: NonZeroU32,
    pub page_size: NonZeroU32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::with_page_size(default_page_size())
    }
}

impl FilterCriteria {
    pub fn with_page_size(page_size: NonZeroU32) -> Self {
        Self {
            assignee: None,
            status: None,
            page: NonZeroU32::MIN,
            page_size,
        }
    }

    pub fn to_query(&self) -> ListNominationsQuery {
        ListNominationsQuery {
            user_id: self.assignee.clone(),
            status: self.status,
            page: self.page.get(),
            limit: self.page_size.get(),
        }
    }

    /// Number of pages needed for `total` items; an empty result still has one.
    pub fn total_pages(&self, total: u64) -> u64 {
        let size = u64::from(self.page_size.get());
        total.div_ceil(size).max(1)
    }
}

/// Owns the list criteria. Changing what is filtered always rewinds to the
/// first page; the page size survives every filter change.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    criteria: FilterCriteria,
}

impl FilterState {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            criteria: FilterCriteria::with_page_size(page_size),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_assignee(&mut self, assignee: Option<UserId>) {
        self.criteria.assignee = assignee;
        self.criteria.page = NonZeroU32::MIN;
    }

    pub fn set_status(&mut self, status: Option<StatusKey>) {
        self.criteria.status = status;
        self.criteria.page = NonZeroU32::MIN;
    }

    pub fn set_page(&mut self, page: NonZeroU32) {
        self.criteria.page = page;
    }

    pub fn set_page_size(&mut self, page_size: NonZeroU32) {
        self.criteria.page_size = page_size;
    }

    pub fn next_page(&mut self) {
        self.criteria.page = self.criteria.page.saturating_add(1);
    }

    pub fn previous_page(&mut self) {
        self.criteria.page =
            NonZeroU32::new(self.criteria.page.get() - 1).unwrap_or(NonZeroU32::MIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).expect("non-zero")
    }

    #[test]
    fn filter_changes_rewind_to_first_page() {
        let mut state = FilterState::new(page(50));
        state.set_page(page(7));
        state.set_assignee(Some(UserId::from("u1")));
        assert_eq!(state.criteria().page.get(), 1);
        assert_eq!(state.criteria().page_size.get(), 50);

        state.set_page(page(3));
        state.set_status(Some(StatusKey::Overdue));
        assert_eq!(state.criteria().page.get(), 1);
        assert_eq!(state.criteria().page_size.get(), 50);

        state.set_page(page(4));
        state.set_status(None);
        assert_eq!(state.criteria().page.get(), 1);
        assert_eq!(state.criteria().status, None);
    }

    #[test]
    fn page_size_change_keeps_filters_and_page() {
        let mut state = FilterState::default();
        state.set_status(Some(StatusKey::ThisWeek));
        state.set_page(page(2));
        state.set_page_size(page(10));
        assert_eq!(state.criteria().page.get(), 2);
        assert_eq!(state.criteria().status, Some(StatusKey::ThisWeek));
    }

    #[test]
    fn previous_page_never_goes_below_one() {
        let mut state = FilterState::default();
        state.previous_page();
        assert_eq!(state.criteria().page.get(), 1);
        state.next_page();
        state.next_page();
        state.previous_page();
        assert_eq!(state.criteria().page.get(), 2);
    }

    #[test]
    fn query_carries_filters_and_cursor() {
        let mut state = FilterState::new(page(25));
        state.set_assignee(Some(UserId::from("u7")));
        state.set_page(page(3));
        let query = state.criteria().to_query();
        assert_eq!(query.user_id, Some(UserId::from("u7")));
        assert_eq!(query.status, None);
        assert_eq!(query.page, 3);
        assert_eq!(query.limit, 25);
    }

    #[test]
    fn counts_pages() {
        let criteria = FilterCriteria::with_page_size(page(20));
        assert_eq!(criteria.total_pages(0), 1);
        assert_eq!(criteria.total_pages(20), 1);
        assert_eq!(criteria.total_pages(21), 2);
    }
}
