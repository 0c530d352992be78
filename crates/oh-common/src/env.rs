//! Environment snapshots.
//!
//! The bootstrap layer never reads `std::env` directly while deriving values.
//! It works on an [`EnvMap`] captured once at the process boundary, so every
//! derivation is a pure function of its inputs and can be tested without
//! touching the real process environment.
//!
//! A key counts as *defined* only when it is present and holds a value that is
//! non-empty after trimming. Empty strings behave exactly like missing keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered snapshot of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvMap(BTreeMap<String, String>);

impl EnvMap {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Raw value, exactly as stored.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Trimmed value if the key is defined and non-empty.
    pub fn get_defined(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Whether the key holds a defined, non-empty value.
    pub fn is_defined(&self, key: &str) -> bool {
        self.get_defined(key).is_some()
    }

    /// Set a key unconditionally.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Set a key only when it is not already defined.
    ///
    /// Returns `true` when the value was written.
    pub fn set_if_undefined(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.is_defined(key) {
            return false;
        }
        self.0.insert(key.to_string(), value.into());
        true
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        EnvMap(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for EnvMap {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
