//! Baseline/overlay context store.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;
use uuid::Uuid;

/// Ordered key/value map used for context parts and options.
pub type Map = IndexMap<String, serde_json::Value>;

/// The state container threaded through an activity invocation.
///
/// A context is split into an immutable baseline, shared between contexts
/// derived from each other, and a mutable overlay that receives every write.
/// Reads consult the overlay first.
///
/// Every context carries an identity. Moving a context keeps it; deriving a
/// new context with [`Context::wrap`], [`Context::fork`] or the constructors
/// creates a new one. Contexts are not `Clone`, so two live values never
/// share an identity.
#[derive(Debug)]
pub struct Context {
    id: Uuid,
    baseline: Arc<Map>,
    overlay: Map,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::from_baseline(Map::new())
    }

    /// Creates a context with the given immutable baseline.
    #[must_use]
    pub fn from_baseline(baseline: Map) -> Self {
        Self {
            id: Uuid::new_v4(),
            baseline: Arc::new(baseline),
            overlay: Map::new(),
        }
    }

    /// Creates a context from key/value pairs used as baseline.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, serde_json::Value)>,
    {
        Self::from_baseline(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Derives a new context whose baseline is this context's visible state.
    ///
    /// Writes to the derived context land in its own, empty overlay.
    #[must_use]
    pub fn wrap(&self) -> Self {
        Self::from_baseline(self.to_map())
    }

    /// Copies baseline and overlay into a new context with its own identity.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            baseline: Arc::clone(&self.baseline),
            overlay: self.overlay.clone(),
        }
    }

    /// Returns the identity of this context.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns true if both values are the same context object.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// Gets a value, overlay first. Absent keys yield `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.overlay.get(key).or_else(|| self.baseline.get(key))
    }

    /// Checks if a key is visible.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.overlay.contains_key(key) || self.baseline.contains_key(key)
    }

    /// Writes a value into the overlay. The baseline is never touched.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.overlay.insert(key.into(), value);
    }

    /// Returns the `(baseline, overlay)` parts.
    #[must_use]
    pub fn decompose(&self) -> (&Map, &Map) {
        (&self.baseline, &self.overlay)
    }

    /// Writes every overlay entry of this context into `other`.
    pub fn merge_overlay_into(&self, other: &mut Self) {
        for (key, value) in &self.overlay {
            other.set(key.clone(), value.clone());
        }
    }

    /// Returns all visible keys: baseline order first, then new overlay keys.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.baseline
            .keys()
            .chain(self.overlay.keys().filter(|k| !self.baseline.contains_key(*k)))
            .map(String::as_str)
            .collect()
    }

    /// Returns the number of visible keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    /// Returns true if no key is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty() && self.overlay.is_empty()
    }

    /// Flattens baseline and overlay into one map.
    #[must_use]
    pub fn to_map(&self) -> Map {
        let mut map = (*self.baseline).clone();
        for (key, value) in &self.overlay {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// Returns the flattened view as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.to_map().into_iter().collect())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let keys = self.keys();
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            map.serialize_entry(key, &self.get(key))?;
        }
        map.end()
    }
}
