//! Settings manager: layered resolution over one or many named configurations.
//!
//! Responsibilities:
//! - Store raw user configuration per key and dispatch bulk writes by mode.
//! - Hold the single mode override layer.
//! - Resolve validated settings lazily and cache them until the next write.
//! - Track the active key and its fallback across rebuilds.
//!
//! Does NOT handle:
//! - Settings validation (delegated to the `SettingsFactory`).
//! - Loading configuration files (see `source`).
//! - Parsing overrides from strings or the environment (see `overrides`).
//!
//! Invariants:
//! - Every successful write invalidates the cache, even when nothing changed.
//! - A valid cache holds exactly one instance per raw key; in single mode
//!   exactly the `DEFAULT_KEY` entry, default-built when nothing was written.
//! - Keys iterate in lexicographic order; the multi mode fallback picks the
//!   first key when the active key disappears across a rebuild.
//! - Setting an absent active key fails and leaves the active key unchanged.
//! - Resolution is all-or-nothing: one failing key leaves the cache invalid.

mod cache;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::ConfigMap;
use crate::constants::DEFAULT_KEY;
use crate::error::SettingsError;
use crate::factory::SettingsFactory;
use crate::merge::merge_maps;
use crate::overrides::OverrideLayer;

use self::cache::SettingsCache;

/// How a manager interprets its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// One configuration under an implicit key, with an override layer.
    Single,
    /// Any number of named configurations, one of them active.
    Multi,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Single => f.write_str("single"),
            Mode::Multi => f.write_str("multi"),
        }
    }
}

/// Mode-specific state. Overrides only exist in single mode.
#[derive(Debug, Clone)]
enum ModeState {
    Single { overrides: OverrideLayer },
    Multi,
}

impl ModeState {
    fn mode(&self) -> Mode {
        match self {
            ModeState::Single { .. } => Mode::Single,
            ModeState::Multi => Mode::Multi,
        }
    }
}

/// Borrowed view of the manager after the cache has been validated.
struct Resolved<'a, F: SettingsFactory> {
    factory: &'a F,
    mode: Mode,
    entries: &'a mut BTreeMap<String, F::Settings>,
    active_key: &'a mut String,
}

/// Resolves validated settings from user configuration and overrides.
///
/// Single mode:
///
/// ```rust,ignore
/// let mut manager = SettingsManager::new(SerdeFactory::<AppSettings>::new());
/// manager.set_user_config(config_map)?;
/// manager.set_override("value", json!(100))?;
/// let settings = manager.current_settings()?;
/// ```
///
/// Multi mode:
///
/// ```rust,ignore
/// let mut manager = SettingsManager::multi(SerdeFactory::<AppSettings>::new());
/// manager.set_user_config(json_map!({"dev": {...}, "prod": {...}}))?;
/// manager.set_active_key("prod")?;
/// let prod = manager.current_settings()?;
/// ```
///
/// Reads take `&mut self` because they may rebuild the cache and move the
/// active key. Share a manager across threads behind a single `Mutex`.
pub struct SettingsManager<F: SettingsFactory> {
    factory: F,
    mode: ModeState,
    user_config: BTreeMap<String, ConfigMap>,
    active_key: String,
    cache: SettingsCache<F::Settings>,
}

impl<F: SettingsFactory> SettingsManager<F> {
    /// Create a single mode manager.
    pub fn new(factory: F) -> Self {
        Self::with_mode(factory, Mode::Single)
    }

    /// Create a multi mode manager.
    pub fn multi(factory: F) -> Self {
        Self::with_mode(factory, Mode::Multi)
    }

    pub fn with_mode(factory: F, mode: Mode) -> Self {
        let mode = match mode {
            Mode::Single => ModeState::Single {
                overrides: OverrideLayer::new(),
            },
            Mode::Multi => ModeState::Multi,
        };

        Self {
            factory,
            mode,
            user_config: BTreeMap::new(),
            active_key: DEFAULT_KEY.to_string(),
            cache: SettingsCache::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn is_multi(&self) -> bool {
        self.mode() == Mode::Multi
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    // =========================================================================
    // User configuration
    // =========================================================================

    /// Write user configuration, interpreted according to the mode.
    ///
    /// - Single mode: `config` replaces the one implicit entry.
    /// - Multi mode, every value an object: `config` maps key to entry and
    ///   replaces the whole store, dropping keys it does not mention.
    /// - Multi mode otherwise: `config` is the entry for the active key.
    ///   Fails with [`SettingsError::AmbiguousWrite`] while no key has been
    ///   chosen and nothing is stored.
    ///
    /// An individual entry whose values are all objects cannot be told apart
    /// from the bulk form and is treated as bulk. Use [`Self::set_entry`] or
    /// [`Self::insert_entry`] to write such an entry.
    pub fn set_user_config(&mut self, config: ConfigMap) -> Result<(), SettingsError> {
        match self.mode {
            ModeState::Single { .. } => self.store_entry(DEFAULT_KEY.to_string(), config),
            ModeState::Multi if is_bulk_config(&config) => self.store_bulk(into_entries(config)),
            ModeState::Multi => self.set_entry(config)?,
        }
        Ok(())
    }

    /// Replace every entry at once (multi mode).
    pub fn set_bulk(&mut self, entries: BTreeMap<String, ConfigMap>) -> Result<(), SettingsError> {
        self.require_multi("set_bulk()")?;
        self.store_bulk(entries);
        Ok(())
    }

    /// Write the entry for the active key.
    ///
    /// In single mode this is the implicit entry. In multi mode it fails
    /// with [`SettingsError::AmbiguousWrite`] while no key has been chosen and
    /// nothing is stored.
    pub fn set_entry(&mut self, config: ConfigMap) -> Result<(), SettingsError> {
        if self.is_multi() && self.active_key == DEFAULT_KEY && self.user_config.is_empty() {
            return Err(SettingsError::AmbiguousWrite);
        }
        let key = self.active_key.clone();
        self.store_entry(key, config);
        Ok(())
    }

    /// Write the entry for `key`, leaving other entries untouched (multi mode).
    pub fn insert_entry(
        &mut self,
        key: impl Into<String>,
        config: ConfigMap,
    ) -> Result<(), SettingsError> {
        self.require_multi("insert_entry()")?;
        self.store_entry(key.into(), config);
        Ok(())
    }

    /// Remove the entry for `key` and return it (multi mode).
    ///
    /// If `key` was active, the next rebuild falls back to the first
    /// remaining key.
    pub fn remove_entry(&mut self, key: &str) -> Result<ConfigMap, SettingsError> {
        self.require_multi("remove_entry()")?;
        let removed = self
            .user_config
            .remove(key)
            .ok_or_else(|| SettingsError::UserConfigKeyNotFound(key.to_string()))?;
        self.invalidate();
        Ok(removed)
    }

    /// Copy of the user configuration.
    ///
    /// Single mode returns the implicit entry (empty if never written); multi
    /// mode returns every entry as `key -> object`.
    pub fn user_config(&self) -> ConfigMap {
        match self.mode {
            ModeState::Single { .. } => self
                .user_config
                .get(DEFAULT_KEY)
                .cloned()
                .unwrap_or_default(),
            ModeState::Multi => self
                .user_config
                .iter()
                .map(|(key, entry)| (key.clone(), Value::Object(entry.clone())))
                .collect(),
        }
    }

    /// Copy of every stored entry, keyed.
    pub fn user_configs(&self) -> BTreeMap<String, ConfigMap> {
        self.user_config.clone()
    }

    /// Copy of the raw entry for `key`, without overrides or validation.
    pub fn raw_config_by_key(&self, key: &str) -> Result<ConfigMap, SettingsError> {
        self.user_config
            .get(key)
            .cloned()
            .ok_or_else(|| SettingsError::UserConfigKeyNotFound(key.to_string()))
    }

    // =========================================================================
    // Overrides (single mode)
    // =========================================================================

    /// The override layer, or `None` in multi mode.
    pub fn overrides(&self) -> Option<&OverrideLayer> {
        match &self.mode {
            ModeState::Single { overrides } => Some(overrides),
            ModeState::Multi => None,
        }
    }

    /// Set one override value by dot-separated path.
    pub fn set_override(&mut self, path: &str, value: Value) -> Result<(), SettingsError> {
        self.overrides_mut("set_override()")?.set(path, value)?;
        self.invalidate();
        Ok(())
    }

    /// Remove one override value, returning it.
    pub fn remove_override(&mut self, path: &str) -> Result<Option<Value>, SettingsError> {
        let removed = self.overrides_mut("remove_override()")?.remove(path);
        self.invalidate();
        Ok(removed)
    }

    /// Replace the whole override layer.
    pub fn set_overrides(&mut self, layer: OverrideLayer) -> Result<(), SettingsError> {
        *self.overrides_mut("set_overrides()")? = layer;
        self.invalidate();
        Ok(())
    }

    pub fn clear_overrides(&mut self) -> Result<(), SettingsError> {
        self.overrides_mut("clear_overrides()")?.clear();
        self.invalidate();
        Ok(())
    }

    // =========================================================================
    // Cache lifecycle
    // =========================================================================

    /// Drop resolved settings; the next read rebuilds them.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Same as [`Self::invalidate`].
    pub fn clear(&mut self) {
        self.invalidate();
    }

    pub fn is_cache_valid(&self) -> bool {
        self.cache.is_valid()
    }

    /// Resolve every entry now if the cache is stale.
    pub fn ensure_valid(&mut self) -> Result<(), SettingsError> {
        self.resolve().map(|_| ())
    }

    fn resolve(&mut self) -> Result<Resolved<'_, F>, SettingsError> {
        let Self {
            factory,
            mode,
            user_config,
            active_key,
            cache,
        } = self;
        let factory = &*factory;

        let entries = cache.get_or_rebuild(|| {
            let entries = build_entries(factory, mode, user_config)?;
            settle_active_key(mode.mode(), active_key, &entries);
            Ok::<_, SettingsError>(entries)
        })?;

        Ok(Resolved {
            factory,
            mode: mode.mode(),
            entries,
            active_key,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Settings for the active key.
    ///
    /// Multi mode fails with [`SettingsError::ActiveKeyNotFound`] when nothing
    /// is stored. Single mode always answers, building defaults if needed.
    pub fn current_settings(&mut self) -> Result<&F::Settings, SettingsError> {
        let Resolved {
            factory,
            mode,
            entries,
            active_key,
        } = self.resolve()?;

        if !entries.contains_key(active_key.as_str()) {
            match mode {
                Mode::Multi => return Err(SettingsError::ActiveKeyNotFound(active_key.clone())),
                Mode::Single => {
                    let settings = factory.build(&ConfigMap::new()).map_err(|err| {
                        SettingsError::Validation {
                            key: DEFAULT_KEY.to_string(),
                            source: Box::new(err),
                        }
                    })?;
                    *active_key = DEFAULT_KEY.to_string();
                    entries.insert(DEFAULT_KEY.to_string(), settings);
                }
            }
        }

        entries
            .get(active_key.as_str())
            .ok_or_else(|| SettingsError::ActiveKeyNotFound(active_key.clone()))
    }

    /// Make `key` the active configuration (multi mode).
    ///
    /// Fails if `key` has no resolved settings; the active key is then left
    /// unchanged.
    pub fn set_active_key(&mut self, key: &str) -> Result<(), SettingsError> {
        self.require_multi("set_active_key()")?;

        let Resolved {
            entries,
            active_key,
            ..
        } = self.resolve()?;
        if !entries.contains_key(key) {
            return Err(SettingsError::KeyNotFound(key.to_string()));
        }

        if active_key.as_str() != key {
            tracing::debug!(from = %active_key, to = %key, "Switching active settings key");
            *active_key = key.to_string();
        }
        Ok(())
    }

    /// The active key. Does not rebuild the cache.
    pub fn active_key(&self) -> &str {
        &self.active_key
    }

    /// Settings for any key, active or not.
    pub fn get_by_key(&mut self, key: &str) -> Result<&F::Settings, SettingsError> {
        let Resolved { entries, .. } = self.resolve()?;
        entries
            .get(key)
            .ok_or_else(|| SettingsError::KeyNotFound(key.to_string()))
    }

    pub fn has_key(&mut self, key: &str) -> Result<bool, SettingsError> {
        let Resolved { entries, .. } = self.resolve()?;
        Ok(entries.contains_key(key))
    }

    /// Every resolved key, in lexicographic order.
    pub fn all_keys(&mut self) -> Result<Vec<String>, SettingsError> {
        let Resolved { entries, .. } = self.resolve()?;
        Ok(entries.keys().cloned().collect())
    }

    /// Copy of every resolved settings instance.
    pub fn all_settings(&mut self) -> Result<BTreeMap<String, F::Settings>, SettingsError> {
        let Resolved { entries, .. } = self.resolve()?;
        Ok(entries.clone())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_multi(&self, operation: &'static str) -> Result<(), SettingsError> {
        match self.mode {
            ModeState::Multi => Ok(()),
            ModeState::Single { .. } => Err(SettingsError::mode_violation(operation, Mode::Multi)),
        }
    }

    fn overrides_mut(&mut self, operation: &'static str) -> Result<&mut OverrideLayer, SettingsError> {
        match &mut self.mode {
            ModeState::Single { overrides } => Ok(overrides),
            ModeState::Multi => Err(SettingsError::mode_violation(operation, Mode::Single)),
        }
    }

    fn store_entry(&mut self, key: String, config: ConfigMap) {
        tracing::debug!(key = %key, fields = config.len(), "Storing user configuration entry");
        self.user_config.insert(key, config);
        self.invalidate();
    }

    fn store_bulk(&mut self, entries: BTreeMap<String, ConfigMap>) {
        tracing::debug!(keys = entries.len(), "Replacing all user configuration entries");
        self.user_config = entries;
        self.invalidate();
    }
}

impl<F> fmt::Debug for SettingsManager<F>
where
    F: SettingsFactory,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsManager")
            .field("mode", &self.mode())
            .field("active_key", &self.active_key)
            .field("keys", &self.user_config.keys().collect::<Vec<_>>())
            .field("cache_valid", &self.cache.is_valid())
            .finish_non_exhaustive()
    }
}

/// Bulk form: every value is itself a mapping (vacuously true when empty).
fn is_bulk_config(config: &ConfigMap) -> bool {
    config.values().all(Value::is_object)
}

fn into_entries(config: ConfigMap) -> BTreeMap<String, ConfigMap> {
    config
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Object(entry) => Some((key, entry)),
            _ => None,
        })
        .collect()
}

fn build_entries<F: SettingsFactory>(
    factory: &F,
    mode: &ModeState,
    user_config: &BTreeMap<String, ConfigMap>,
) -> Result<BTreeMap<String, F::Settings>, SettingsError> {
    let build = |key: &str, config: &ConfigMap| {
        factory
            .build(config)
            .map_err(|err| SettingsError::Validation {
                key: key.to_string(),
                source: Box::new(err),
            })
    };

    match mode {
        ModeState::Multi => {
            tracing::debug!(keys = user_config.len(), "Rebuilding settings cache");
            user_config
                .iter()
                .map(|(key, config)| Ok((key.clone(), build(key, config)?)))
                .collect()
        }
        ModeState::Single { overrides } => {
            tracing::debug!(
                overrides = !overrides.is_empty(),
                "Rebuilding settings cache"
            );
            let base = user_config.get(DEFAULT_KEY).cloned().unwrap_or_default();
            let merged = merge_maps(base, overrides.as_map());
            let settings = build(DEFAULT_KEY, &merged)?;
            Ok(BTreeMap::from([(DEFAULT_KEY.to_string(), settings)]))
        }
    }
}

fn settle_active_key<S>(mode: Mode, active_key: &mut String, entries: &BTreeMap<String, S>) {
    match mode {
        Mode::Single => {
            *active_key = DEFAULT_KEY.to_string();
        }
        Mode::Multi => {
            if entries.contains_key(active_key.as_str()) {
                return;
            }
            if let Some(first) = entries.keys().next() {
                tracing::debug!(
                    missing = %active_key,
                    fallback = %first,
                    "Active settings key not found after rebuild, falling back to first key"
                );
                *active_key = first.clone();
            }
        }
    }
}
