//! Canonical in-memory record representation.

use std::collections::BTreeMap;
use std::fmt;

use crate::key::DataKey;
use crate::value::DataValue;

/// A record: a mapping from single-segment keys to values, where nested
/// structure is expressed through nested wrappers.
///
/// Multi-segment keys passed to [`set`](Self::set) and [`get`](Self::get) walk
/// (and create) the nested wrappers, so `location.x` lives in a `location`
/// sub-wrapper under key `x`. There is never more than one entry per key at a
/// given nesting level.
#[derive(Clone, Default, PartialEq)]
pub struct DataWrapper {
    entries: BTreeMap<String, DataValue>,
}

impl DataWrapper {
    /// Create an empty wrapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, creating intermediate wrappers for multi-segment keys.
    ///
    /// An intermediate entry that is not a wrapper is replaced by one.
    /// Setting an empty key is a no-op.
    pub fn set(&mut self, key: &DataKey, value: impl Into<DataValue>) -> &mut Self {
        let segments = key.segments();
        match segments {
            [] => {}
            [last] => {
                self.entries.insert(last.clone(), value.into());
            }
            [head, ..] => {
                let slot = self
                    .entries
                    .entry(head.clone())
                    .or_insert_with(|| DataValue::Wrapper(DataWrapper::new()));
                if !matches!(slot, DataValue::Wrapper(_)) {
                    *slot = DataValue::Wrapper(DataWrapper::new());
                }
                if let DataValue::Wrapper(inner) = slot {
                    inner.set(&key.rest(), value);
                }
            }
        }
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<DataKey>, value: impl Into<DataValue>) -> Self {
        self.set(&key.into(), value);
        self
    }

    /// Get a value by key, walking nested wrappers.
    pub fn get(&self, key: &DataKey) -> Option<&DataValue> {
        let (head, rest) = key.segments().split_first()?;
        let value = self.entries.get(head)?;
        if rest.is_empty() {
            Some(value)
        } else {
            value.as_wrapper()?.get(&key.rest())
        }
    }

    /// Get a string value by key.
    pub fn get_str(&self, key: &DataKey) -> Option<&str> {
        self.get(key).and_then(DataValue::as_str)
    }

    /// Get a nested wrapper by key.
    pub fn get_wrapper(&self, key: &DataKey) -> Option<&DataWrapper> {
        self.get(key).and_then(DataValue::as_wrapper)
    }

    /// Remove a value by key, returning it.
    pub fn remove(&mut self, key: &DataKey) -> Option<DataValue> {
        let (head, rest) = key.segments().split_first()?;
        if rest.is_empty() {
            return self.entries.remove(head);
        }
        match self.entries.get_mut(head)? {
            DataValue::Wrapper(inner) => inner.remove(&key.rest()),
            _ => None,
        }
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &DataKey) -> bool {
        self.get(key).is_some()
    }

    /// Keys of this wrapper.
    ///
    /// With `deep == false` only the top-level keys are returned. With
    /// `deep == true` every leaf path is returned, descending into nested
    /// wrappers (lists are leaves).
    pub fn keys(&self, deep: bool) -> Vec<DataKey> {
        let mut out = Vec::new();
        for (name, value) in &self.entries {
            let key = DataKey::of(name.clone());
            match value {
                DataValue::Wrapper(inner) if deep => {
                    for child in inner.keys(true) {
                        out.push(key.join(&child));
                    }
                }
                _ => out.push(key),
            }
        }
        out
    }

    /// Iterate over top-level entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the wrapper has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for DataWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
