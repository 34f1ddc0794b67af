//! Resolved settings cache.
//!
//! Responsibilities:
//! - Track whether resolved settings are current.
//! - Rebuild all entries at once through a caller-supplied closure.
//!
//! Does NOT handle:
//! - Deciding how entries are built (see `SettingsManager::ensure_valid`).
//!
//! Invariants:
//! - The cache is either fully populated or empty; there is no partial state.
//! - A failed rebuild leaves the cache invalid so the next read retries.

use std::collections::BTreeMap;

/// Cache of resolved settings keyed by configuration key.
#[derive(Debug, Clone)]
pub(crate) struct SettingsCache<S> {
    entries: Option<BTreeMap<String, S>>,
}

impl<S> Default for SettingsCache<S> {
    fn default() -> Self {
        Self { entries: None }
    }
}

impl<S> SettingsCache<S> {
    pub(crate) fn is_valid(&self) -> bool {
        self.entries.is_some()
    }

    /// Drop every cached entry and mark the cache stale.
    pub(crate) fn invalidate(&mut self) {
        if self.entries.take().is_some() {
            tracing::trace!("Settings cache invalidated");
        }
    }

    /// Return the cached entries, rebuilding them with `rebuild` if stale.
    pub(crate) fn get_or_rebuild<E>(
        &mut self,
        rebuild: impl FnOnce() -> Result<BTreeMap<String, S>, E>,
    ) -> Result<&mut BTreeMap<String, S>, E> {
        let entries = match self.entries.take() {
            Some(entries) => entries,
            None => rebuild()?,
        };
        Ok(self.entries.insert(entries))
    }
}
