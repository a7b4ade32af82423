use std::fmt::{Display, Formatter};

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::firestore::constants::AUTO_ID_LENGTH;
use crate::firestore::error::{invalid_argument, FirestoreErrorCode, FirestoreResult};
use crate::firestore::model::ResourcePath;
use crate::firestore::remote::datastore::RemoteDocument;
use crate::firestore::value::{FirestoreValue, MapValue};

use super::database::Firestore;
use super::operations::{encode_update_data, merge_set_data, SetOptions};
use super::query::{Query, QuerySnapshot};
use super::snapshot::{DocumentSnapshot, QueryDocumentSnapshot, WriteResult};

/// A validated handle to a collection (`project/collection[/doc/collection...]`).
#[derive(Clone, Debug)]
pub struct CollectionReference {
    firestore: Firestore,
    path: ResourcePath,
}

impl CollectionReference {
    pub(crate) fn new(firestore: Firestore, path: ResourcePath) -> FirestoreResult<Self> {
        firestore.resolver().validate_collection_path(&path)?;
        Ok(Self { firestore, path })
    }

    pub fn firestore(&self) -> &Firestore {
        &self.firestore
    }

    /// The project-qualified path, e.g. `demo/users/alice/posts`.
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn project_id(&self) -> &str {
        self.path.first_segment().unwrap_or_default()
    }

    /// The collection name (the last path segment).
    pub fn id(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }

    /// The document that contains this collection, or `None` for a root collection.
    pub fn parent(&self) -> Option<DocumentReference> {
        let parent = self.path.without_last();
        if parent.len() < 3 {
            return None;
        }
        Some(DocumentReference::from_trusted(self.firestore.clone(), parent))
    }

    /// A reference to `document_id` in this collection, or to a fresh
    /// auto-generated id when `None`.
    pub fn doc(&self, document_id: Option<&str>) -> FirestoreResult<DocumentReference> {
        let id = match document_id {
            Some(id) => id.to_string(),
            None => generate_auto_id(),
        };
        if id.contains('/') {
            return Err(invalid_argument("Document ID cannot contain '/'"));
        }
        DocumentReference::new(self.firestore.clone(), self.path.child([id]))
    }

    /// Creates a document with a server-assigned id.
    pub async fn add(&self, data: MapValue) -> FirestoreResult<DocumentReference> {
        let created = self
            .firestore
            .datastore()
            .create_document(&self.path, &data)
            .await?;
        log::debug!("added document '{}'", created.path);
        Ok(DocumentReference::from_trusted(self.firestore.clone(), created.path))
    }

    /// Reads every document in the collection. A collection the server does
    /// not know about reads as empty.
    pub async fn get(&self) -> FirestoreResult<QuerySnapshot> {
        let documents = match self.firestore.datastore().list_documents(&self.path).await {
            Ok(documents) => documents,
            Err(err) if err.code == FirestoreErrorCode::NotFound => {
                log::debug!("collection '{}' not found; returning empty snapshot", self.path);
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        let documents = documents
            .into_iter()
            .map(|document| self.firestore.query_document(document))
            .collect();
        Ok(QuerySnapshot::new(self.query(), documents))
    }

    /// A query over this collection with no constraints.
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }
}

impl Display for CollectionReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CollectionReference({})", self.path)
    }
}

impl PartialEq for CollectionReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

/// A validated handle to a single document (`project/collection/doc[...]`).
#[derive(Clone, Debug)]
pub struct DocumentReference {
    firestore: Firestore,
    path: ResourcePath,
}

impl DocumentReference {
    pub(crate) fn new(firestore: Firestore, path: ResourcePath) -> FirestoreResult<Self> {
        firestore.resolver().validate_document_path(&path)?;
        Ok(Self { firestore, path })
    }

    // Paths handed back by the datastore may carry ids outside the client's
    // identifier rules.
    pub(crate) fn from_trusted(firestore: Firestore, path: ResourcePath) -> Self {
        Self { firestore, path }
    }

    pub fn firestore(&self) -> &Firestore {
        &self.firestore
    }

    pub fn id(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }

    /// The project-qualified path, e.g. `demo/users/alice`.
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn project_id(&self) -> &str {
        self.path.first_segment().unwrap_or_default()
    }

    pub fn parent(&self) -> CollectionReference {
        CollectionReference {
            firestore: self.firestore.clone(),
            path: self.path.without_last(),
        }
    }

    /// A subcollection below this document. `path` may itself nest further
    /// (`"posts/p1/comments"`) but must end at a collection.
    pub fn collection(&self, path: &str) -> FirestoreResult<CollectionReference> {
        let relative = ResourcePath::parse(path)?;
        CollectionReference::new(self.firestore.clone(), self.path.child(relative.iter().cloned()))
    }

    /// Reads the document. A missing document yields a snapshot with
    /// `exists() == false`.
    pub async fn get(&self) -> FirestoreResult<DocumentSnapshot> {
        match self.firestore.datastore().get_document(&self.path).await {
            Ok(document) => Ok(self.firestore.document_snapshot(document)),
            Err(err) if err.code == FirestoreErrorCode::NotFound => {
                log::debug!("document '{}' not found", self.path);
                Ok(DocumentSnapshot::missing(self.clone()))
            }
            Err(err) => Err(err),
        }
    }

    /// Writes `data` to the document, creating it if needed.
    ///
    /// With merge options the stored document is read first and combined
    /// with `data` client-side; the read and the write are not atomic.
    pub async fn set(&self, data: MapValue, options: Option<SetOptions>) -> FirestoreResult<WriteResult> {
        let options = options.unwrap_or_default();
        let datastore = self.firestore.datastore();
        let document = if options.is_merge() {
            let existing = match datastore.get_document(&self.path).await {
                Ok(document) => Some(document.fields),
                Err(err) if err.code == FirestoreErrorCode::NotFound => None,
                Err(err) => return Err(err),
            };
            merge_set_data(existing.as_ref(), data, &options)?
        } else {
            data
        };
        datastore.set_document(&self.path, &document).await
    }

    /// Updates selected fields of an existing document. Keys may be dotted
    /// paths (`"profile.lastLogin"`); untouched fields are preserved. Fails
    /// with `NotFound` when the document does not exist.
    pub async fn update<I, K>(&self, data: I) -> FirestoreResult<WriteResult>
    where
        I: IntoIterator<Item = (K, FirestoreValue)>,
        K: Into<String>,
    {
        let encoded = encode_update_data(data.into_iter().map(|(key, value)| (key.into(), value)).collect())?;
        self.firestore
            .datastore()
            .update_document(&self.path, &encoded.map, &encoded.field_paths)
            .await
    }

    pub async fn delete(&self) -> FirestoreResult<()> {
        self.firestore.datastore().delete_document(&self.path).await
    }
}

impl Display for DocumentReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentReference({})", self.path)
    }
}

impl PartialEq for DocumentReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Firestore {
    pub(crate) fn document_snapshot(&self, document: RemoteDocument) -> DocumentSnapshot {
        DocumentSnapshot::new(
            DocumentReference::from_trusted(self.clone(), document.path),
            Some(document.fields),
            document.create_time,
            document.update_time,
            document.id_source,
        )
    }

    pub(crate) fn query_document(&self, document: RemoteDocument) -> QueryDocumentSnapshot {
        QueryDocumentSnapshot::new(
            DocumentReference::from_trusted(self.clone(), document.path),
            document.fields,
            document.create_time,
            document.update_time,
            document.id_source,
        )
    }
}

/// A 20 character alphanumeric id.
pub(crate) fn generate_auto_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(AUTO_ID_LENGTH)
        .collect()
}
