//! Immutable view of the user settings record.

use std::sync::Arc;

use serde_json::{Map, Value};

/// The full settings record at one instant.
///
/// Cheap to clone (shared map). Never mutated in place: [`Snapshot::with`]
/// returns a new snapshot.
#[derive(Debug, Clone, Default)]
pub struct Snapshot(Arc<Map<String, Value>>);

impl Snapshot {
    /// Snapshot with no keys. Every enable flag reads as `false`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }

    /// Accepts only a JSON object; anything else is not a settings record.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from_map(map)),
            _ => None,
        }
    }

    /// Build a snapshot from key/value pairs (insertion order is kept).
    #[cfg(test)]
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `true` only for a literal boolean `true`; absent or non-boolean is `false`.
    pub fn is_enabled(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    /// Copy of this snapshot with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut map = (*self.0).clone();
        map.insert(key.into(), value.into());
        Self::from_map(map)
    }

    #[cfg(test)]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pretty JSON with 2-space indent, the on-disk format.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.0)
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}
