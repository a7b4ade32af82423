use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::firestore::api::snapshot::DocumentIdSource;
use crate::firestore::constants::ID_FIELD_CANDIDATES;
use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::{DatabaseId, FieldPath, ResourcePath, Timestamp};
use crate::firestore::remote::datastore::RemoteDocument;
use crate::firestore::value::{BytesValue, FirestoreValue, MapValue, ValueKind};

/// Encodes values and document records in the tagged REST dialect
/// (`{"stringValue": "x"}`, `{"integerValue": "1"}`, ...).
#[derive(Clone, Debug)]
pub struct JsonProtoSerializer {
    database_id: DatabaseId,
}

impl JsonProtoSerializer {
    pub fn new(database_id: DatabaseId) -> Self {
        Self { database_id }
    }

    pub fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    /// `projects/{project}/databases/{database}` for the project owning `path`.
    pub fn database_name(&self, path: &ResourcePath) -> String {
        let project = path
            .first_segment()
            .unwrap_or_else(|| self.database_id.project_id());
        format!("projects/{project}/databases/{}", self.database_id.database())
    }

    /// Fully qualified resource name for a project-qualified document or
    /// collection path.
    pub fn resource_name(&self, path: &ResourcePath) -> String {
        let relative = path.pop_first();
        if relative.is_empty() {
            format!("{}/documents", self.database_name(path))
        } else {
            format!("{}/documents/{}", self.database_name(path), relative.canonical_string())
        }
    }

    /// Inverse of [`resource_name`](Self::resource_name).
    pub fn parse_resource_name(&self, name: &str) -> FirestoreResult<ResourcePath> {
        let segments: Vec<&str> = name.split('/').collect();
        if segments.len() < 5
            || segments[0] != "projects"
            || segments[2] != "databases"
            || segments[4] != "documents"
        {
            return Err(invalid_argument(format!("Malformed resource name '{name}'")));
        }
        let mut path = ResourcePath::from_segments([segments[1]]);
        for segment in &segments[5..] {
            if segment.is_empty() {
                return Err(invalid_argument(format!("Malformed resource name '{name}'")));
            }
            path = path.child([*segment]);
        }
        Ok(path)
    }

    pub fn encode_document_fields(&self, map: &MapValue) -> FirestoreResult<JsonValue> {
        Ok(json!({ "fields": encode_map_fields(map)? }))
    }

    /// Decodes the `fields` of a document record. A record without `fields`
    /// is an existing document with no data.
    pub fn decode_document_fields(&self, record: &JsonValue) -> FirestoreResult<MapValue> {
        decode_map_value(record)
    }

    pub fn encode_value(&self, value: &FirestoreValue) -> FirestoreResult<JsonValue> {
        encode_value(value)
    }

    /// Server form of a field path: segments that are not plain identifiers
    /// are backquoted.
    pub fn field_path(&self, field_path: &FieldPath) -> String {
        field_path
            .segments()
            .iter()
            .map(|segment| {
                let mut chars = segment.chars();
                let simple = chars
                    .next()
                    .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
                if simple {
                    segment.clone()
                } else {
                    format!("`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn decode_value(&self, value: &JsonValue) -> FirestoreResult<FirestoreValue> {
        decode_value(value)
    }

    /// Decodes a record fetched from a known document path.
    pub fn decode_document_at(&self, record: &JsonValue, path: &ResourcePath) -> FirestoreResult<RemoteDocument> {
        Ok(RemoteDocument {
            path: path.clone(),
            fields: self.decode_document_fields(record)?,
            create_time: decode_optional_timestamp(record, "createTime")?,
            update_time: decode_optional_timestamp(record, "updateTime")?,
            id_source: DocumentIdSource::Name,
        })
    }

    /// Decodes one document record returned by the server.
    ///
    /// The id comes from the structured `name` when present, then from an
    /// `id`, `_id` or `ID` field, and is otherwise synthesized from `index`
    /// and the current time.
    pub fn decode_document(
        &self,
        record: &JsonValue,
        collection: &ResourcePath,
        index: usize,
    ) -> FirestoreResult<RemoteDocument> {
        let fields = self.decode_document_fields(record)?;
        let create_time = decode_optional_timestamp(record, "createTime")?;
        let update_time = decode_optional_timestamp(record, "updateTime")?;

        if let Some(name) = record.get("name").and_then(JsonValue::as_str) {
            let path = self.parse_resource_name(name)?;
            return Ok(RemoteDocument {
                path,
                fields,
                create_time,
                update_time,
                id_source: DocumentIdSource::Name,
            });
        }

        let (id, id_source) = match explicit_id(record, &fields) {
            Some(id) => (id, DocumentIdSource::Field),
            None => {
                let id = format!("{index}_{}", chrono::Utc::now().timestamp_millis());
                log::warn!(
                    "Document record in '{collection}' carries no name or id field; using synthesized id '{id}'"
                );
                (id, DocumentIdSource::Synthesized)
            }
        };

        Ok(RemoteDocument {
            path: collection.child([id]),
            fields,
            create_time,
            update_time,
            id_source,
        })
    }
}

fn explicit_id(record: &JsonValue, fields: &MapValue) -> Option<String> {
    ID_FIELD_CANDIDATES.iter().find_map(|candidate| {
        record
            .get(*candidate)
            .and_then(JsonValue::as_str)
            .or_else(|| fields.get(candidate).and_then(FirestoreValue::as_str))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    })
}

fn decode_optional_timestamp(record: &JsonValue, key: &str) -> FirestoreResult<Option<Timestamp>> {
    match record.get(key).and_then(JsonValue::as_str) {
        Some(value) => Timestamp::parse_rfc3339(value).map(Some),
        None => Ok(None),
    }
}

fn encode_map_fields(map: &MapValue) -> FirestoreResult<JsonValue> {
    let mut fields = JsonMap::new();
    for (key, value) in map.fields() {
        fields.insert(key.clone(), encode_value(value)?);
    }
    Ok(JsonValue::Object(fields))
}

fn encode_value(value: &FirestoreValue) -> FirestoreResult<JsonValue> {
    let encoded = match value.kind() {
        ValueKind::Null => json!({ "nullValue": JsonValue::Null }),
        ValueKind::Boolean(boolean) => json!({ "booleanValue": boolean }),
        ValueKind::Integer(integer) => json!({ "integerValue": integer.to_string() }),
        ValueKind::Double(double) => {
            if double.is_nan() {
                json!({ "doubleValue": "NaN" })
            } else if double.is_infinite() {
                let text = if double.is_sign_positive() { "Infinity" } else { "-Infinity" };
                json!({ "doubleValue": text })
            } else {
                json!({ "doubleValue": double })
            }
        }
        ValueKind::Timestamp(timestamp) => json!({ "timestampValue": timestamp.to_rfc3339()? }),
        ValueKind::String(string) => json!({ "stringValue": string }),
        ValueKind::Bytes(bytes) => json!({ "bytesValue": bytes.to_base64() }),
        ValueKind::Reference(reference) => json!({ "referenceValue": reference }),
        ValueKind::Array(array) => {
            let values = array
                .values()
                .iter()
                .map(encode_value)
                .collect::<FirestoreResult<Vec<_>>>()?;
            json!({ "arrayValue": { "values": values } })
        }
        ValueKind::Map(map) => json!({ "mapValue": { "fields": encode_map_fields(map)? } }),
    };
    Ok(encoded)
}

fn decode_map_value(value: &JsonValue) -> FirestoreResult<MapValue> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid_argument("Expected object for map value"))?;
    let fields_object = match object.get("fields") {
        Some(fields) => fields
            .as_object()
            .ok_or_else(|| invalid_argument("Expected 'fields' to be an object"))?,
        None => return Ok(MapValue::default()),
    };

    let mut fields = BTreeMap::new();
    for (key, value) in fields_object {
        fields.insert(key.clone(), decode_value(value)?);
    }
    Ok(MapValue::new(fields))
}

fn decode_value(value: &JsonValue) -> FirestoreResult<FirestoreValue> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid_argument("Expected tagged value object"))?;
    let (tag, inner) = object
        .iter()
        .next()
        .ok_or_else(|| invalid_argument("Tagged value object is empty"))?;

    match tag.as_str() {
        "nullValue" => Ok(FirestoreValue::null()),
        "booleanValue" => inner
            .as_bool()
            .map(FirestoreValue::from_bool)
            .ok_or_else(|| invalid_argument("booleanValue must be bool")),
        "integerValue" => {
            let parsed = match inner {
                JsonValue::String(text) => i64::from_str(text)
                    .map_err(|err| invalid_argument(format!("Invalid integerValue: {err}")))?,
                JsonValue::Number(number) => number
                    .as_i64()
                    .ok_or_else(|| invalid_argument("integerValue out of range"))?,
                _ => return Err(invalid_argument("integerValue must be a string or number")),
            };
            Ok(FirestoreValue::from_integer(parsed))
        }
        "doubleValue" => {
            let parsed = match inner {
                JsonValue::Number(number) => number
                    .as_f64()
                    .ok_or_else(|| invalid_argument("Invalid doubleValue"))?,
                JsonValue::String(text) => text
                    .parse::<f64>()
                    .map_err(|err| invalid_argument(format!("Invalid doubleValue: {err}")))?,
                _ => return Err(invalid_argument("doubleValue must be a number or string")),
            };
            Ok(FirestoreValue::from_double(parsed))
        }
        "timestampValue" => {
            let text = inner
                .as_str()
                .ok_or_else(|| invalid_argument("timestampValue must be string"))?;
            Ok(FirestoreValue::from_timestamp(Timestamp::parse_rfc3339(text)?))
        }
        "stringValue" => inner
            .as_str()
            .map(FirestoreValue::from_string)
            .ok_or_else(|| invalid_argument("stringValue must be string")),
        "bytesValue" => {
            let text = inner
                .as_str()
                .ok_or_else(|| invalid_argument("bytesValue must be base64 string"))?;
            let bytes = BytesValue::from_base64(text)
                .map_err(|err| invalid_argument(format!("Invalid bytesValue: {err}")))?;
            Ok(FirestoreValue::from_bytes(bytes))
        }
        "referenceValue" => inner
            .as_str()
            .map(FirestoreValue::from_reference)
            .ok_or_else(|| invalid_argument("referenceValue must be string")),
        "arrayValue" => {
            let values = match inner.get("values").and_then(JsonValue::as_array) {
                Some(entries) => entries
                    .iter()
                    .map(decode_value)
                    .collect::<FirestoreResult<Vec<_>>>()?,
                None => Vec::new(),
            };
            Ok(FirestoreValue::from_array(values))
        }
        "mapValue" => Ok(FirestoreValue::from(decode_map_value(inner)?)),
        other => Err(invalid_argument(format!("Unknown value type '{other}'"))),
    }
}
