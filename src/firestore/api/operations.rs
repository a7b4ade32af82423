use std::collections::{BTreeMap, HashSet};

use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::FieldPath;
use crate::firestore::value::{FirestoreValue, MapValue, ValueKind};

/// Controls how `DocumentReference::set` combines new data with an existing document.
///
/// Merging is shallow: only top-level keys are combined, nested maps are
/// replaced wholesale. When `merge_fields` is present it takes precedence over
/// `merge`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub merge: bool,
    pub merge_fields: Option<Vec<String>>,
}

impl SetOptions {
    /// Keep existing keys that the new data does not mention.
    pub fn merge_all() -> Self {
        Self {
            merge: true,
            merge_fields: None,
        }
    }

    /// Write only the named top-level fields; everything else stays as stored.
    pub fn merge_fields<I, S>(fields: I) -> FirestoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique = Vec::new();
        let mut seen = HashSet::new();
        for field in fields {
            let field = field.into();
            if field.is_empty() {
                return Err(invalid_argument("merge_fields entries cannot be empty"));
            }
            if seen.insert(field.clone()) {
                unique.push(field);
            }
        }
        if unique.is_empty() {
            return Err(invalid_argument("merge_fields requires at least one field name"));
        }
        Ok(Self {
            merge: false,
            merge_fields: Some(unique),
        })
    }

    /// Whether the write needs the stored document first.
    pub fn is_merge(&self) -> bool {
        self.merge || self.merge_fields.is_some()
    }
}

/// Computes the document that a `set` with `options` leaves behind.
pub(crate) fn merge_set_data(
    existing: Option<&MapValue>,
    data: MapValue,
    options: &SetOptions,
) -> FirestoreResult<MapValue> {
    if !options.is_merge() {
        return Ok(data);
    }

    let mut merged = existing.map(|map| map.fields().clone()).unwrap_or_default();
    let mut incoming = data.into_fields();
    match &options.merge_fields {
        Some(fields) => {
            for field in fields {
                let value = incoming.remove(field).ok_or_else(|| {
                    invalid_argument(format!(
                        "Field '{field}' is specified in merge_fields but missing from the input data"
                    ))
                })?;
                merged.insert(field.clone(), value);
            }
        }
        None => merged.extend(incoming),
    }
    Ok(MapValue::new(merged))
}

/// Nested data plus the field mask for an `update`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EncodedUpdateData {
    pub map: MapValue,
    pub field_paths: Vec<FieldPath>,
}

/// Expands dotted keys (`"profile.lastLogin"`) into nested maps and collects
/// the corresponding field paths.
pub(crate) fn encode_update_data(data: BTreeMap<String, FirestoreValue>) -> FirestoreResult<EncodedUpdateData> {
    if data.is_empty() {
        return Err(invalid_argument("update requires at least one field/value pair"));
    }

    let mut field_paths: Vec<FieldPath> = Vec::with_capacity(data.len());
    let mut fields = BTreeMap::new();
    for (key, value) in data {
        let path = FieldPath::from_dot_separated(&key)?;
        if let Some(conflict) = field_paths.iter().find(|other| overlaps(other, &path)) {
            return Err(invalid_argument(format!(
                "Update fields '{conflict}' and '{path}' overlap"
            )));
        }
        set_value_at_field_path(&mut fields, &path, value);
        field_paths.push(path);
    }

    Ok(EncodedUpdateData {
        map: MapValue::new(fields),
        field_paths,
    })
}

fn overlaps(left: &FieldPath, right: &FieldPath) -> bool {
    left.segments()
        .iter()
        .zip(right.segments())
        .all(|(l, r)| l == r)
}

/// Writes `value` at `path`, creating intermediate maps and replacing any
/// non-map value found on the way.
pub(crate) fn set_value_at_field_path(
    fields: &mut BTreeMap<String, FirestoreValue>,
    path: &FieldPath,
    value: FirestoreValue,
) {
    set_value_at_segments(fields, path.segments(), value);
}

fn set_value_at_segments(fields: &mut BTreeMap<String, FirestoreValue>, segments: &[String], value: FirestoreValue) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        fields.insert(first.clone(), value);
        return;
    }

    let mut child = match fields.remove(first).map(FirestoreValue::into_kind) {
        Some(ValueKind::Map(map)) => map.into_fields(),
        _ => BTreeMap::new(),
    };
    set_value_at_segments(&mut child, rest, value);
    fields.insert(first.clone(), FirestoreValue::from_map(child));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, FirestoreValue)]) -> MapValue {
        entries.iter().cloned().collect()
    }

    #[test]
    fn plain_set_replaces() {
        let existing = map(&[("a", 1.into()), ("b", 2.into())]);
        let result = merge_set_data(Some(&existing), map(&[("b", 3.into())]), &SetOptions::default()).unwrap();
        assert_eq!(result, map(&[("b", 3.into())]));
    }

    #[test]
    fn merge_keeps_untouched_keys() {
        let existing = map(&[("a", 1.into()), ("b", 2.into())]);
        let result = merge_set_data(
            Some(&existing),
            map(&[("b", 3.into()), ("c", 4.into())]),
            &SetOptions::merge_all(),
        )
        .unwrap();
        assert_eq!(result, map(&[("a", 1.into()), ("b", 3.into()), ("c", 4.into())]));
    }

    #[test]
    fn merge_is_shallow() {
        let existing = map(&[("profile", map(&[("a", 1.into()), ("b", 2.into())]).into())]);
        let result = merge_set_data(
            Some(&existing),
            map(&[("profile", map(&[("b", 3.into())]).into())]),
            &SetOptions::merge_all(),
        )
        .unwrap();
        assert_eq!(result, map(&[("profile", map(&[("b", 3.into())]).into())]));
    }

    #[test]
    fn merge_fields_writes_only_listed_keys() {
        let existing = map(&[("a", 1.into()), ("b", 2.into())]);
        let options = SetOptions::merge_fields(["b"]).unwrap();
        let result = merge_set_data(
            Some(&existing),
            map(&[("b", 3.into()), ("c", 4.into())]),
            &options,
        )
        .unwrap();
        assert_eq!(result, map(&[("a", 1.into()), ("b", 3.into())]));
    }

    #[test]
    fn merge_fields_missing_from_data_is_rejected() {
        let options = SetOptions::merge_fields(["missing"]).unwrap();
        let err = merge_set_data(None, map(&[("b", 3.into())]), &options).unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
        assert!(SetOptions::merge_fields(Vec::<String>::new()).is_err());
    }

    #[test]
    fn merge_into_missing_document_starts_empty() {
        let result = merge_set_data(None, map(&[("a", 1.into())]), &SetOptions::merge_all()).unwrap();
        assert_eq!(result, map(&[("a", 1.into())]));
    }

    #[test]
    fn update_expands_dotted_keys() {
        let mut data = BTreeMap::new();
        data.insert("profile.lastLogin".to_string(), FirestoreValue::from(5));
        data.insert("age".to_string(), FirestoreValue::from(31));
        let encoded = encode_update_data(data).unwrap();

        let paths: Vec<_> = encoded.field_paths.iter().map(FieldPath::canonical_string).collect();
        assert_eq!(paths, vec!["age", "profile.lastLogin"]);
        assert_eq!(
            encoded.map,
            map(&[
                ("age", 31.into()),
                ("profile", map(&[("lastLogin", 5.into())]).into()),
            ])
        );
    }

    #[test]
    fn update_rejects_overlapping_paths() {
        let mut data = BTreeMap::new();
        data.insert("profile".to_string(), FirestoreValue::null());
        data.insert("profile.lastLogin".to_string(), FirestoreValue::from(5));
        assert!(encode_update_data(data).is_err());
        assert!(encode_update_data(BTreeMap::new()).is_err());
    }

    #[test]
    fn set_value_replaces_scalars_on_the_way() {
        let mut fields = BTreeMap::new();
        fields.insert("profile".to_string(), FirestoreValue::from("flat"));
        let path = FieldPath::from_dot_separated("profile.lastLogin").unwrap();
        set_value_at_field_path(&mut fields, &path, 9.into());
        assert_eq!(
            MapValue::new(fields).get_path(&path),
            Some(&FirestoreValue::from(9))
        );
    }
}
