use std::collections::{BTreeSet, HashSet};

/// What the select-all control covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectAllScope {
    /// Only the entries of the currently fetched page
    #[default]
    Page,
    /// Every entry matching the current search, across all pages
    AllMatching,
}

/// Selected key identities for one list.
///
/// Only keys that have appeared in a fetched page can be selected. The set
/// survives page navigation so a batch can span pages.
#[derive(Debug, Default, Clone)]
pub struct SelectionTracker {
    selected: BTreeSet<String>,
    observed: HashSet<String>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record keys seen in a fetched page
    pub fn observe<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observed.extend(keys.into_iter().map(Into::into));
    }

    /// Flip one key. Returns whether it is now selected; unseen keys stay unselected.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.selected.remove(key) {
            return false;
        }
        if !self.observed.contains(key) {
            return false;
        }
        self.selected.insert(key.to_string());
        true
    }

    /// Select-all / clear-all control for the visible page.
    ///
    /// If every visible key is already selected, the whole selection is
    /// cleared; otherwise the visible keys are added. Returns whether the
    /// visible page is fully selected afterwards.
    pub fn toggle_all(&mut self, visible: &[String]) -> bool {
        if visible.is_empty() || self.all_selected(visible) {
            self.selected.clear();
            return false;
        }
        self.select_many(visible.iter().cloned());
        true
    }

    /// Select `keys`, marking them observed
    pub fn select_many<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        for key in keys {
            self.observed.insert(key.clone());
            self.selected.insert(key);
        }
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.contains(key)
    }

    /// True when `visible` is non-empty and entirely selected
    pub fn all_selected(&self, visible: &[String]) -> bool {
        !visible.is_empty() && visible.iter().all(|key| self.selected.contains(key))
    }

    pub fn selected(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether `key` has appeared in a fetched page of this list
    pub fn has_seen(&self, key: &str) -> bool {
        self.observed.contains(key)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Clear the selection and every observed key. Used when the search
    /// changes; the next fetched page seeds the observed set again.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.observed.clear();
    }

    /// Drop keys that no longer exist from the selection and the observed set
    pub fn forget<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for key in keys {
            self.selected.remove(key);
            self.observed.remove(key);
        }
    }
}
