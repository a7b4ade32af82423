use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::FieldPath;
use crate::firestore::value::{FirestoreValue, ValueKind};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapValue {
    fields: BTreeMap<String, FirestoreValue>,
}

impl MapValue {
    pub fn new(fields: BTreeMap<String, FirestoreValue>) -> Self {
        Self { fields }
    }

    /// Builds a map from any serde type that serializes to a JSON object.
    pub fn from_serializable<T: Serialize>(value: &T) -> FirestoreResult<Self> {
        let json = serde_json::to_value(value)
            .map_err(|err| invalid_argument(format!("Failed to serialize document data: {err}")))?;
        match FirestoreValue::from_json(&json).into_kind() {
            ValueKind::Map(map) => Ok(map),
            _ => Err(invalid_argument("Document data must serialize to an object")),
        }
    }

    /// Deserializes the map into a serde type through its plain JSON view.
    pub fn to_typed<T: DeserializeOwned>(&self) -> FirestoreResult<T> {
        serde_json::from_value(FirestoreValue::from(self.clone()).to_json())
            .map_err(|err| invalid_argument(format!("Failed to deserialize document data: {err}")))
    }

    pub fn fields(&self) -> &BTreeMap<String, FirestoreValue> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, FirestoreValue> {
        self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FirestoreValue> {
        self.fields.get(key)
    }

    /// Walks nested maps along `path`. Any missing or non-map segment yields `None`.
    pub fn get_path(&self, path: &FieldPath) -> Option<&FirestoreValue> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.fields.get(first)?;
        for segment in rest {
            current = current.as_map()?.fields.get(segment)?;
        }
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K> FromIterator<(K, FirestoreValue)> for MapValue
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, FirestoreValue)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

impl From<BTreeMap<String, FirestoreValue>> for MapValue {
    fn from(fields: BTreeMap<String, FirestoreValue>) -> Self {
        Self::new(fields)
    }
}
