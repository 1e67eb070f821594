//! The `Data` member of request and response envelopes.
//!
//! # Design
//! A closed enum instead of a trait object: the set of shapes is fixed by the
//! API, callers match on it after decoding, and every variant renders through
//! the same [`FieldMap`] rules.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::delivery::DeliveryInfo;
use crate::fields::FieldMap;
use crate::order::{ExternalOrder, ExternalOrderBase};

/// Untyped `Data`, used when no conversion is registered for a function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBag {
    properties: BTreeMap<String, Value>,
}

impl DataBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(property.into(), value.into());
        self
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        for (key, value) in &self.properties {
            fields.set(key.as_str(), value.clone());
        }
        fields
    }
}

impl From<Map<String, Value>> for DataBag {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            properties: map.into_iter().collect(),
        }
    }
}

/// Key used when `Data` is a bare scalar.
pub const SCALAR_KEY: &str = "Value";

/// Objects keep their properties. Arrays are keyed by index (`"0"`, `"1"`,
/// ...), so `[]` becomes an empty bag. Any other value is stored under
/// [`SCALAR_KEY`].
impl From<Value> for DataBag {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from(map),
            Value::Array(values) => Self {
                properties: values
                    .into_iter()
                    .enumerate()
                    .map(|(index, v)| (index.to_string(), v))
                    .collect(),
            },
            scalar => {
                let mut bag = Self::new();
                bag.insert(SCALAR_KEY, scalar);
                bag
            }
        }
    }
}

/// One of the payload shapes the partner API exchanges.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Generic(DataBag),
    OrderBase(ExternalOrderBase),
    Order(ExternalOrder),
    DeliveryInfo(DeliveryInfo),
}

impl Payload {
    pub fn to_fields(&self) -> FieldMap {
        match self {
            Payload::Generic(bag) => bag.to_fields(),
            Payload::OrderBase(base) => base.to_fields(),
            Payload::Order(order) => order.to_fields(),
            Payload::DeliveryInfo(info) => info.to_fields(),
        }
    }

    pub fn as_generic(&self) -> Option<&DataBag> {
        match self {
            Payload::Generic(bag) => Some(bag),
            _ => None,
        }
    }

    pub fn as_order_base(&self) -> Option<&ExternalOrderBase> {
        match self {
            Payload::OrderBase(base) => Some(base),
            _ => None,
        }
    }

    pub fn as_order(&self) -> Option<&ExternalOrder> {
        match self {
            Payload::Order(order) => Some(order),
            _ => None,
        }
    }

    pub fn as_delivery_info(&self) -> Option<&DeliveryInfo> {
        match self {
            Payload::DeliveryInfo(info) => Some(info),
            _ => None,
        }
    }
}

impl From<DataBag> for Payload {
    fn from(bag: DataBag) -> Self {
        Payload::Generic(bag)
    }
}

impl From<ExternalOrderBase> for Payload {
    fn from(base: ExternalOrderBase) -> Self {
        Payload::OrderBase(base)
    }
}

impl From<ExternalOrder> for Payload {
    fn from(order: ExternalOrder) -> Self {
        Payload::Order(order)
    }
}

impl From<DeliveryInfo> for Payload {
    fn from(info: DeliveryInfo) -> Self {
        Payload::DeliveryInfo(info)
    }
}
