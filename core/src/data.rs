//! Resolved view of a parsed registry.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Flag, Value};

/// One entry of the [`Data`] view.
#[derive(Debug, Clone)]
pub struct DataEntry<'a> {
    pub key: String,
    /// `None` for a flag that has neither a value nor a default.
    pub value: Option<Value>,
    /// The flag the value was read from.
    pub source: &'a Flag,
}

/// Canonical flag names mapped to their resolved values.
///
/// Aliases never appear as keys. Entries of the unknown bucket are reported
/// as `true` under their disambiguated key. Every entry keeps a reference to
/// the [`Flag`] it came from.
///
/// # Examples
///
/// ```
/// use argflags_core::{FlagRegistry, Value};
///
/// let mut registry = FlagRegistry::new();
/// registry.parse("-r -hdr \"CF-IPCountry=US\" demo.js");
///
/// let data = registry.data();
/// assert_eq!(data.get("r"), Some(&Value::Bool(true)));
/// assert_eq!(data.get("hdr"), Some(&Value::from("CF-IPCountry=US")));
/// assert_eq!(data.get("demo.js"), Some(&Value::Bool(true)));
/// assert_eq!(data.source("hdr").unwrap().input_name(), "hdr");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Data<'a> {
    entries: Vec<DataEntry<'a>>,
}

impl<'a> Data<'a> {
    pub(crate) fn push(&mut self, key: String, value: Option<Value>, source: &'a Flag) {
        self.entries.push(DataEntry { key, value, source });
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entry(key).and_then(|entry| entry.value.as_ref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// The flag that produced the value stored under `key`.
    pub fn source(&self, key: &str) -> Option<&'a Flag> {
        self.entry(key).map(|entry| entry.source)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataEntry<'a>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain JSON object of the data (unset values become `null`).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn entry(&self, key: &str) -> Option<&DataEntry<'a>> {
        self.entries.iter().find(|entry| entry.key == key)
    }
}

impl Serialize for Data<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}
