//! Selected point-of-interest categories.

use alertx_category_models::CategoryKey;

/// An ordered set of selected categories.
///
/// Insertion order is kept so selected categories render as removable tags
/// in the order they were picked. Membership is the only test used by
/// [`Self::toggle`], so a key can never appear twice.
///
/// Equality ignores order: two selections are equal when they hold the same
/// keys.
#[derive(Debug, Clone, Default)]
pub struct CategorySelection {
    keys: Vec<CategoryKey>,
}

impl CategorySelection {
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Adds `key` if absent, removes it if present. Returns whether the key
    /// is selected afterwards.
    pub fn toggle(&mut self, key: CategoryKey) -> bool {
        if self.remove(key) {
            false
        } else {
            self.keys.push(key);
            true
        }
    }

    /// Removes `key`. Returns `false` (and does nothing) if it was not
    /// selected.
    pub fn remove(&mut self, key: CategoryKey) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| *k != key);
        self.keys.len() != before
    }

    #[must_use]
    pub fn contains(&self, key: CategoryKey) -> bool {
        self.keys.contains(&key)
    }

    #[must_use]
    pub fn keys(&self) -> &[CategoryKey] {
        &self.keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl PartialEq for CategorySelection {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.keys.iter().all(|k| other.contains(*k))
    }
}

impl Eq for CategorySelection {}

impl FromIterator<CategoryKey> for CategorySelection {
    fn from_iter<I: IntoIterator<Item = CategoryKey>>(iter: I) -> Self {
        let mut selection = Self::new();
        for key in iter {
            if !selection.contains(key) {
                selection.keys.push(key);
            }
        }
        selection
    }
}
