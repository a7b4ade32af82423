use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

use crate::firestore::model::Timestamp;
use crate::firestore::value::{ArrayValue, BytesValue, MapValue};

/// A single document field value.
#[derive(Clone, Debug, PartialEq)]
pub struct FirestoreValue {
    kind: ValueKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Bytes(BytesValue),
    Reference(String),
    Array(ArrayValue),
    Map(MapValue),
}

impl FirestoreValue {
    pub fn null() -> Self {
        Self {
            kind: ValueKind::Null,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self {
            kind: ValueKind::Boolean(value),
        }
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            kind: ValueKind::Integer(value),
        }
    }

    pub fn from_double(value: f64) -> Self {
        Self {
            kind: ValueKind::Double(value),
        }
    }

    pub fn from_timestamp(value: Timestamp) -> Self {
        Self {
            kind: ValueKind::Timestamp(value),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn from_bytes(value: BytesValue) -> Self {
        Self {
            kind: ValueKind::Bytes(value),
        }
    }

    pub fn from_reference(path: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Reference(path.into()),
        }
    }

    pub fn from_array(values: Vec<FirestoreValue>) -> Self {
        Self {
            kind: ValueKind::Array(ArrayValue::new(values)),
        }
    }

    pub fn from_map(map: BTreeMap<String, FirestoreValue>) -> Self {
        Self {
            kind: ValueKind::Map(MapValue::new(map)),
        }
    }

    /// Converts plain JSON into a value. Integral numbers that fit in an `i64`
    /// become integers, every other number becomes a double.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::null(),
            JsonValue::Bool(value) => Self::from_bool(*value),
            JsonValue::Number(number) => match number.as_i64() {
                Some(integer) => Self::from_integer(integer),
                None => Self::from_double(number.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(value) => Self::from_string(value.clone()),
            JsonValue::Array(values) => Self::from_array(values.iter().map(Self::from_json).collect()),
            JsonValue::Object(entries) => Self::from_map(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Plain JSON view of the value. Timestamps become RFC 3339 strings and
    /// bytes become base64, so this is lossy in the JSON -> value direction.
    pub fn to_json(&self) -> JsonValue {
        match &self.kind {
            ValueKind::Null => JsonValue::Null,
            ValueKind::Boolean(value) => JsonValue::Bool(*value),
            ValueKind::Integer(value) => JsonValue::from(*value),
            ValueKind::Double(value) => JsonNumber::from_f64(*value)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ValueKind::Timestamp(value) => value
                .to_rfc3339()
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
            ValueKind::String(value) | ValueKind::Reference(value) => JsonValue::String(value.clone()),
            ValueKind::Bytes(bytes) => JsonValue::String(bytes.to_base64()),
            ValueKind::Array(array) => JsonValue::Array(array.values().iter().map(Self::to_json).collect()),
            ValueKind::Map(map) => {
                let mut object = JsonMap::new();
                for (key, value) in map.fields() {
                    object.insert(key.clone(), value.to_json());
                }
                JsonValue::Object(object)
            }
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn into_kind(self) -> ValueKind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match &self.kind {
            ValueKind::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match &self.kind {
            ValueKind::Integer(value) => Some(*value as f64),
            ValueKind::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            ValueKind::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match &self.kind {
            ValueKind::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match &self.kind {
            ValueKind::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Equality used by query filters: integers and doubles compare by numeric
    /// value, everything else structurally.
    pub fn loosely_equals(&self, other: &FirestoreValue) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Integer(a), ValueKind::Double(b)) | (ValueKind::Double(b), ValueKind::Integer(a)) => {
                (*a as f64) == *b
            }
            _ => self == other,
        }
    }
}

impl Display for FirestoreValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean(value) => write!(f, "{value}"),
            ValueKind::Integer(value) => write!(f, "{value}"),
            ValueKind::Double(value) => write!(f, "{value}"),
            ValueKind::String(value) | ValueKind::Reference(value) => write!(f, "{value}"),
            _ => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<bool> for FirestoreValue {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<i64> for FirestoreValue {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<i32> for FirestoreValue {
    fn from(value: i32) -> Self {
        Self::from_integer(i64::from(value))
    }
}

impl From<f64> for FirestoreValue {
    fn from(value: f64) -> Self {
        Self::from_double(value)
    }
}

impl From<&str> for FirestoreValue {
    fn from(value: &str) -> Self {
        Self::from_string(value)
    }
}

impl From<String> for FirestoreValue {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

impl From<Timestamp> for FirestoreValue {
    fn from(value: Timestamp) -> Self {
        Self::from_timestamp(value)
    }
}

impl<T> From<Vec<T>> for FirestoreValue
where
    T: Into<FirestoreValue>,
{
    fn from(values: Vec<T>) -> Self {
        Self::from_array(values.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, FirestoreValue>> for FirestoreValue {
    fn from(map: BTreeMap<String, FirestoreValue>) -> Self {
        Self::from_map(map)
    }
}

impl From<MapValue> for FirestoreValue {
    fn from(map: MapValue) -> Self {
        Self {
            kind: ValueKind::Map(map),
        }
    }
}
