use std::collections::BTreeSet;

use shared::domain::NominationId;

/// Rows checked for a bulk operation. Only ids of the loaded page are
/// meaningful; callers prune with [`SelectionSet::retain_visible`] whenever the
/// page is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<Id: Ord = NominationId> {
    ids: BTreeSet<Id>,
}

impl<Id: Ord> Default for SelectionSet<Id> {
    fn default() -> Self {
        Self {
            ids: BTreeSet::new(),
        }
    }
}

impl<Id: Ord + Clone> SelectionSet<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `id` and returns whether it is now selected.
    pub fn toggle(&mut self, id: Id) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn set(&mut self, id: Id, checked: bool) {
        if checked {
            self.ids.insert(id);
        } else {
            self.ids.remove(&id);
        }
    }

    /// Replaces the selection with exactly the given page.
    pub fn select_all(&mut self, page_ids: &[Id]) {
        self.ids = page_ids.iter().cloned().collect();
    }

    /// Header checkbox handler: checking selects the page, unchecking clears.
    pub fn toggle_all(&mut self, checked: bool, page_ids: &[Id]) {
        if checked {
            self.select_all(page_ids);
        } else {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    /// Drops ids that are not on the new page and returns how many were dropped.
    pub fn retain_visible(&mut self, page_ids: &[Id]) -> usize {
        let before = self.ids.len();
        let visible: BTreeSet<&Id> = page_ids.iter().collect();
        self.ids.retain(|id| visible.contains(id));
        before - self.ids.len()
    }

    pub fn ids(&self) -> Vec<Id> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// State of the "select all" checkbox, derived on every read.
pub fn all_selected<Id: Ord + Clone>(selection: &SelectionSet<Id>, page_ids: &[Id]) -> bool {
    !selection.is_empty() && selection.len() == page_ids.len()
}
