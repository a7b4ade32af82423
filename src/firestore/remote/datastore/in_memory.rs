use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::firestore::api::operations::set_value_at_field_path;
use crate::firestore::api::reference::generate_auto_id;
use crate::firestore::api::snapshot::{DocumentIdSource, WriteResult};
use crate::firestore::error::{internal_error, not_found, unavailable, FirestoreResult};
use crate::firestore::model::{FieldPath, ResourcePath, Timestamp};
use crate::firestore::value::MapValue;

use super::{Datastore, RemoteDocument, RunQueryRequest};

#[derive(Clone, Debug)]
struct StoredDocument {
    fields: MapValue,
    create_time: Timestamp,
    update_time: Timestamp,
}

/// Process-local datastore keyed by canonical document path.
///
/// It does not evaluate structured queries, so queries against it always run
/// client-side.
#[derive(Clone, Default)]
pub struct InMemoryDatastore {
    documents: Arc<Mutex<BTreeMap<String, StoredDocument>>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    pub fn contains(&self, path: &ResourcePath) -> bool {
        self.store().contains_key(&path.canonical_string())
    }

    fn store(&self) -> MutexGuard<'_, BTreeMap<String, StoredDocument>> {
        self.documents
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn write(&self, path: &ResourcePath, fields: MapValue) -> WriteResult {
        let now = Timestamp::now();
        let mut store = self.store();
        let create_time = store
            .get(&path.canonical_string())
            .map(|existing| existing.create_time)
            .unwrap_or(now);
        store.insert(
            path.canonical_string(),
            StoredDocument {
                fields,
                create_time,
                update_time: now,
            },
        );
        WriteResult::new(now)
    }
}

fn to_remote(path: ResourcePath, stored: &StoredDocument) -> RemoteDocument {
    RemoteDocument {
        path,
        fields: stored.fields.clone(),
        create_time: Some(stored.create_time),
        update_time: Some(stored.update_time),
        id_source: DocumentIdSource::Name,
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Datastore for InMemoryDatastore {
    async fn get_document(&self, path: &ResourcePath) -> FirestoreResult<RemoteDocument> {
        let store = self.store();
        store
            .get(&path.canonical_string())
            .map(|stored| to_remote(path.clone(), stored))
            .ok_or_else(|| not_found(format!("Document '{path}' does not exist")))
    }

    async fn list_documents(&self, collection: &ResourcePath) -> FirestoreResult<Vec<RemoteDocument>> {
        let store = self.store();
        let mut documents = Vec::new();
        for (key, stored) in store.iter() {
            let path = ResourcePath::parse(key)?;
            if path.len() == collection.len() + 1 && collection.is_prefix_of(&path) {
                documents.push(to_remote(path, stored));
            }
        }
        Ok(documents)
    }

    async fn set_document(&self, path: &ResourcePath, data: &MapValue) -> FirestoreResult<WriteResult> {
        Ok(self.write(path, data.clone()))
    }

    async fn update_document(
        &self,
        path: &ResourcePath,
        data: &MapValue,
        field_paths: &[FieldPath],
    ) -> FirestoreResult<WriteResult> {
        let current = self
            .store()
            .get(&path.canonical_string())
            .map(|stored| stored.fields.clone())
            .ok_or_else(|| not_found(format!("Document '{path}' does not exist")))?;

        let mut fields = current.into_fields();
        for field_path in field_paths {
            let value = data.get_path(field_path).cloned().ok_or_else(|| {
                internal_error(format!("Update data has no value for '{field_path}'"))
            })?;
            set_value_at_field_path(&mut fields, field_path, value);
        }
        Ok(self.write(path, MapValue::new(fields)))
    }

    async fn delete_document(&self, path: &ResourcePath) -> FirestoreResult<()> {
        self.store().remove(&path.canonical_string());
        Ok(())
    }

    async fn create_document(&self, collection: &ResourcePath, data: &MapValue) -> FirestoreResult<RemoteDocument> {
        let path = collection.child([generate_auto_id()]);
        self.write(&path, data.clone());
        let store = self.store();
        store
            .get(&path.canonical_string())
            .map(|stored| to_remote(path.clone(), stored))
            .ok_or_else(|| internal_error(format!("Document '{path}' vanished after create")))
    }

    async fn run_query(&self, _request: &RunQueryRequest) -> FirestoreResult<Vec<RemoteDocument>> {
        Err(unavailable("InMemoryDatastore does not evaluate structured queries"))
    }

    fn supports_structured_query(&self) -> bool {
        false
    }
}
