//! Feature flag store: immutable defaults plus a runtime override layer
//!
//! Defaults are fixed at load time. Overrides are published as whole maps
//! through [`ArcSwap`]: a writer clones the current map, applies its change
//! and stores the new `Arc`. Readers load the current map without locking
//! and see either the old or the new map, never a partial update. Writers
//! serialize on a mutex so concurrent updates are not lost.
//!
//! # Example
//!
//! ```
//! use rolegate_policy::FeatureFlagStore;
//!
//! let store = FeatureFlagStore::with_defaults([("newUI", false)]);
//! assert!(!store.is_enabled("newUI"));
//!
//! store.set_override("newUI", true);
//! assert!(store.is_enabled("newUI"));
//!
//! store.clear_override("newUI");
//! assert!(!store.is_enabled("newUI"));
//! ```

use crate::types::FlagKey;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Override state of a single flag key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagState {
    /// No override; the default (or `false`) applies
    DefaultOnly,
    /// Overridden to `true`
    OverriddenTrue,
    /// Overridden to `false`
    OverriddenFalse,
}

/// Immutable merged view of defaults and overrides
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlagSnapshot {
    flags: Arc<HashMap<FlagKey, bool>>,
}

impl FlagSnapshot {
    /// Flag value; unknown keys are disabled
    pub fn is_enabled(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    /// Flag value, or `None` for a key absent from both layers
    pub fn get(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl From<HashMap<FlagKey, bool>> for FlagSnapshot {
    fn from(flags: HashMap<FlagKey, bool>) -> Self {
        Self {
            flags: Arc::new(flags),
        }
    }
}

/// Merge defaults and overrides into a snapshot; overrides win on collision
pub fn merge(defaults: &HashMap<FlagKey, bool>, overrides: &HashMap<FlagKey, bool>) -> FlagSnapshot {
    let mut flags = defaults.clone();
    flags.extend(overrides.iter().map(|(key, value)| (key.clone(), *value)));
    FlagSnapshot::from(flags)
}

/// Feature flag store with a copy-on-write override layer
pub struct FeatureFlagStore {
    /// Load-time defaults, never mutated
    defaults: Arc<HashMap<FlagKey, bool>>,

    /// Currently published override map
    overrides: ArcSwap<HashMap<FlagKey, bool>>,

    /// Serializes writers; readers never take it
    write_lock: Mutex<()>,
}

impl FeatureFlagStore {
    /// Create a store with the given defaults and no overrides
    pub fn new(defaults: HashMap<FlagKey, bool>) -> Self {
        info!("Feature flag store initialized with {} defaults", defaults.len());

        Self {
            defaults: Arc::new(defaults),
            overrides: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store from `(key, default)` pairs
    pub fn with_defaults<I, K>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<FlagKey>,
    {
        Self::new(
            defaults
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Whether the flag is on: override, else default, else `false`
    pub fn is_enabled(&self, key: &str) -> bool {
        if let Some(value) = self.overrides.load().get(key) {
            return *value;
        }

        self.default_or_disabled(key)
    }

    /// Value and override state of `key`, both read from one override map
    pub fn describe(&self, key: &str) -> (bool, FlagState) {
        match self.overrides.load().get(key) {
            Some(true) => (true, FlagState::OverriddenTrue),
            Some(false) => (false, FlagState::OverriddenFalse),
            None => (self.default_or_disabled(key), FlagState::DefaultOnly),
        }
    }

    fn default_or_disabled(&self, key: &str) -> bool {
        match self.defaults.get(key) {
            Some(value) => *value,
            None => {
                debug!("Flag '{}' has no default or override, treating as disabled", key);
                false
            }
        }
    }

    /// Override state of `key`
    pub fn state(&self, key: &str) -> FlagState {
        match self.overrides.load().get(key) {
            Some(true) => FlagState::OverriddenTrue,
            Some(false) => FlagState::OverriddenFalse,
            None => FlagState::DefaultOnly,
        }
    }

    /// Set an override; setting the current value again is a no-op
    pub fn set_override(&self, key: impl Into<FlagKey>, value: bool) {
        let key = key.into();
        let _guard = self.write_lock.lock();

        let current = self.overrides.load_full();
        if current.get(&key) == Some(&value) {
            debug!("Override '{}' already set to {}", key, value);
            return;
        }

        let mut next = (*current).clone();
        next.insert(key.clone(), value);
        self.overrides.store(Arc::new(next));

        info!("Feature flag override set: {}={}", key, value);
    }

    /// Clear an override, returning the key to its default
    ///
    /// Returns whether an override was present.
    pub fn clear_override(&self, key: &str) -> bool {
        let _guard = self.write_lock.lock();

        let current = self.overrides.load_full();
        if !current.contains_key(key) {
            return false;
        }

        let mut next = (*current).clone();
        next.remove(key);
        self.overrides.store(Arc::new(next));

        info!("Feature flag override cleared: {}", key);
        true
    }

    /// Drop every override
    pub fn clear_all_overrides(&self) {
        let _guard = self.write_lock.lock();
        self.overrides.store(Arc::new(HashMap::new()));
        info!("All feature flag overrides cleared");
    }

    /// Default value of `key`, if one was loaded
    pub fn default_value(&self, key: &str) -> Option<bool> {
        self.defaults.get(key).copied()
    }

    /// Currently published override map
    pub fn overrides(&self) -> Arc<HashMap<FlagKey, bool>> {
        self.overrides.load_full()
    }

    /// Merged read snapshot of defaults and current overrides
    pub fn snapshot(&self) -> FlagSnapshot {
        merge(&self.defaults, &self.overrides.load())
    }
}

impl Default for FeatureFlagStore {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl std::fmt::Debug for FeatureFlagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureFlagStore")
            .field("defaults", &self.defaults)
            .field("overrides", &*self.overrides.load_full())
            .finish()
    }
}
