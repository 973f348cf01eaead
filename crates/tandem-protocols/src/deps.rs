//! Per-agent dependency bundle.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read-only bundle of caller-supplied values (credentials, flags, limits).
///
/// Cloning is cheap and never copies the values; a bundle is immutable once
/// built, so it can be shared freely for the duration of a run.
#[derive(Clone, Default)]
pub struct Dependencies {
    values: Arc<HashMap<String, serde_json::Value>>,
}

impl Dependencies {
    /// An empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bundle from an existing map.
    pub fn from_map(values: HashMap<String, serde_json::Value>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// Start building a bundle.
    pub fn builder() -> DependenciesBuilder {
        DependenciesBuilder::default()
    }

    /// Typed lookup. Returns `None` when missing or of the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Raw lookup.
    pub fn get_raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if both handles point at the same bundle.
    pub fn same_bundle(&self, other: &Dependencies) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

// Values may hold credentials, so only keys are printed.
impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Dependencies").field("keys", &keys).finish()
    }
}

/// Builder for [`Dependencies`].
#[derive(Default)]
pub struct DependenciesBuilder {
    values: HashMap<String, serde_json::Value>,
}

impl DependenciesBuilder {
    /// Insert a value. Values that fail to serialize are skipped.
    pub fn insert<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.values.insert(key.into(), v);
        }
        self
    }

    pub fn build(self) -> Dependencies {
        Dependencies::from_map(self.values)
    }
}
