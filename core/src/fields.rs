//! Key-sorted JSON object used for every wire payload.
//!
//! # Design
//! Entries live in a `BTreeMap`, so serialization always walks keys in
//! ascending byte order no matter how they were inserted, and identical
//! content renders to identical bytes. Only keys that were explicitly set
//! are rendered; `0`, `""` and `false` are ordinary values and are emitted.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A single value stored in a [`FieldMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Any scalar or raw JSON value (string, number, bool, null, arrays).
    Json(Value),
    /// A nested payload rendered with the same ordering rules.
    Map(FieldMap),
}

impl FieldValue {
    /// Returns the value as plain JSON, flattening nested maps.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Json(v) => v.clone(),
            FieldValue::Map(m) => m.to_json(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Json(v) => v.serialize(serializer),
            FieldValue::Map(m) => m.serialize(serializer),
        }
    }
}

/// Ordered, sparse JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), FieldValue::Json(value.into()));
        self
    }

    /// Set `key` only when `value` is `Some`; `None` leaves the key absent.
    pub fn set_opt<V: Into<Value>>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.set(key, v);
        }
        self
    }

    /// Set `key` to a nested map, or to JSON `null` when `nested` is `None`.
    pub fn set_nested(&mut self, key: impl Into<String>, nested: Option<FieldMap>) -> &mut Self {
        let value = match nested {
            Some(map) => FieldValue::Map(map),
            None => FieldValue::Json(Value::Null),
        };
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Keys in rendering order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy every entry of `other` into `self`, overwriting duplicates.
    pub fn extend(&mut self, other: FieldMap) -> &mut Self {
        self.fields.extend(other.fields);
        self
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Render as compact JSON text.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
