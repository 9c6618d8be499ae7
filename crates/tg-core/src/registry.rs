//! Per-entity enable/disable flags that survive edits to the document.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::EntityId;

/// Document-scoped map from entity label to enabled flag.
///
/// Entries are created by first sight (`ensure`, defaulting to enabled) or by
/// an explicit user `set`. Nothing removes an entry except [`clear`], which
/// only the host calls when the document is reset.
///
/// [`clear`]: ToggleRegistry::clear
#[derive(Debug, Clone, Default)]
pub struct ToggleRegistry {
    entries: IndexMap<EntityId, bool>,
}

impl ToggleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` as enabled unless it is already known. Returns whether an
    /// entry was inserted.
    pub fn ensure(&mut self, id: &EntityId) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        self.entries.insert(id.clone(), true);
        true
    }

    /// Overwrite the flag for `id`, inserting it if absent. Returns the
    /// previous value.
    pub fn set(&mut self, id: EntityId, enabled: bool) -> Option<bool> {
        self.entries.insert(id, enabled)
    }

    /// Flip a known entry and return its new value.
    pub fn toggle(&mut self, label: &str) -> Option<bool> {
        let flag = self.entries.get_mut(label)?;
        *flag = !*flag;
        Some(*flag)
    }

    /// Stored flag for `label`; labels never seen count as disabled.
    #[must_use]
    pub fn is_enabled(&self, label: &str) -> bool {
        self.entries.get(label).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<bool> {
        self.entries.get(label).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-sight order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, bool)> {
        self.entries.iter().map(|(id, enabled)| (id, *enabled))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Immutable copy for generation and background work.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            entries: Arc::new(self.entries.clone()),
        }
    }
}

/// Frozen view of a [`ToggleRegistry`]. Cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    entries: Arc<IndexMap<EntityId, bool>>,
}

impl RegistrySnapshot {
    #[must_use]
    pub fn is_enabled(&self, label: &str) -> bool {
        self.entries.get(label).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<bool> {
        self.entries.get(label).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, bool)> {
        self.entries.iter().map(|(id, enabled)| (id, *enabled))
    }
}

impl FromIterator<(EntityId, bool)> for RegistrySnapshot {
    fn from_iter<I: IntoIterator<Item = (EntityId, bool)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}
