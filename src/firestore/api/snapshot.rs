use serde::de::DeserializeOwned;

use crate::firestore::error::FirestoreResult;
use crate::firestore::model::{IntoFieldPath, Timestamp};
use crate::firestore::value::{FirestoreValue, MapValue};

use super::reference::DocumentReference;

/// Where a document's id came from when it was decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DocumentIdSource {
    /// The record carried a structured resource name.
    #[default]
    Name,
    /// Taken from an `id`, `_id` or `ID` field of the record.
    Field,
    /// Made up from the record's position and the current time. Such ids are
    /// not stable across reads.
    Synthesized,
}

/// Outcome of a successful write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteResult {
    update_time: Timestamp,
}

impl WriteResult {
    pub fn new(update_time: Timestamp) -> Self {
        Self { update_time }
    }

    pub fn update_time(&self) -> Timestamp {
        self.update_time
    }
}

/// A document read at a point in time. Missing documents produce a snapshot
/// with `exists() == false` rather than an error.
#[derive(Clone, Debug)]
pub struct DocumentSnapshot {
    reference: DocumentReference,
    data: Option<MapValue>,
    create_time: Option<Timestamp>,
    update_time: Option<Timestamp>,
    id_source: DocumentIdSource,
}

impl DocumentSnapshot {
    pub(crate) fn new(
        reference: DocumentReference,
        data: Option<MapValue>,
        create_time: Option<Timestamp>,
        update_time: Option<Timestamp>,
        id_source: DocumentIdSource,
    ) -> Self {
        Self {
            reference,
            data,
            create_time,
            update_time,
            id_source,
        }
    }

    pub(crate) fn missing(reference: DocumentReference) -> Self {
        Self::new(reference, None, None, None, DocumentIdSource::Name)
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// The document fields, or `None` when the document does not exist.
    pub fn data(&self) -> Option<&MapValue> {
        self.data.as_ref()
    }

    /// Deserializes the fields into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> FirestoreResult<Option<T>> {
        self.data.as_ref().map(MapValue::to_typed).transpose()
    }

    /// Reads a possibly nested field such as `"profile.lastLogin"`.
    pub fn get(&self, field: impl IntoFieldPath) -> FirestoreResult<Option<&FirestoreValue>> {
        let path = field.into_field_path()?;
        Ok(self.data.as_ref().and_then(|data| data.get_path(&path)))
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    pub fn create_time(&self) -> Option<Timestamp> {
        self.create_time
    }

    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }

    pub fn id_source(&self) -> DocumentIdSource {
        self.id_source
    }

    /// Narrows an existing snapshot to a query result.
    pub fn into_query_document(self) -> Option<QueryDocumentSnapshot> {
        let data = self.data?;
        Some(QueryDocumentSnapshot {
            reference: self.reference,
            data,
            create_time: self.create_time,
            update_time: self.update_time,
            id_source: self.id_source,
        })
    }
}

/// A snapshot produced by a query or collection read; the document always exists.
#[derive(Clone, Debug)]
pub struct QueryDocumentSnapshot {
    reference: DocumentReference,
    data: MapValue,
    create_time: Option<Timestamp>,
    update_time: Option<Timestamp>,
    id_source: DocumentIdSource,
}

impl QueryDocumentSnapshot {
    pub(crate) fn new(
        reference: DocumentReference,
        data: MapValue,
        create_time: Option<Timestamp>,
        update_time: Option<Timestamp>,
        id_source: DocumentIdSource,
    ) -> Self {
        Self {
            reference,
            data,
            create_time,
            update_time,
            id_source,
        }
    }

    pub fn data(&self) -> &MapValue {
        &self.data
    }

    pub fn data_as<T: DeserializeOwned>(&self) -> FirestoreResult<T> {
        self.data.to_typed()
    }

    pub fn get(&self, field: impl IntoFieldPath) -> FirestoreResult<Option<&FirestoreValue>> {
        let path = field.into_field_path()?;
        Ok(self.data.get_path(&path))
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    pub fn create_time(&self) -> Option<Timestamp> {
        self.create_time
    }

    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }

    pub fn id_source(&self) -> DocumentIdSource {
        self.id_source
    }
}

impl From<QueryDocumentSnapshot> for DocumentSnapshot {
    fn from(snapshot: QueryDocumentSnapshot) -> Self {
        DocumentSnapshot::new(
            snapshot.reference,
            Some(snapshot.data),
            snapshot.create_time,
            snapshot.update_time,
            snapshot.id_source,
        )
    }
}
