use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::firestore::api::snapshot::{DocumentIdSource, WriteResult};
use crate::firestore::error::{unauthenticated, FirestoreResult};
use crate::firestore::model::{FieldPath, ResourcePath, Timestamp};
use crate::firestore::value::MapValue;
use crate::util::jwt;

pub mod http;
pub mod in_memory;

/// A document as returned by a datastore, addressed by its project-qualified path.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteDocument {
    pub path: ResourcePath,
    pub fields: MapValue,
    pub create_time: Option<Timestamp>,
    pub update_time: Option<Timestamp>,
    pub id_source: DocumentIdSource,
}

impl RemoteDocument {
    pub fn id(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }
}

/// A compiled structured query ready to be posted to the server.
#[derive(Clone, Debug, PartialEq)]
pub struct RunQueryRequest {
    /// The queried collection, project-qualified.
    pub collection: ResourcePath,
    /// Tagged `structuredQuery` body.
    pub structured_query: serde_json::Value,
}

/// Storage backend behind references and queries.
///
/// Paths passed in are already resolved and validated. `get_document` and
/// `update_document` report missing documents as `NotFound`.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Datastore: Send + Sync + 'static {
    async fn get_document(&self, path: &ResourcePath) -> FirestoreResult<RemoteDocument>;

    async fn list_documents(&self, collection: &ResourcePath) -> FirestoreResult<Vec<RemoteDocument>>;

    /// Replaces the document at `path` with `data`, creating it if needed.
    async fn set_document(&self, path: &ResourcePath, data: &MapValue) -> FirestoreResult<WriteResult>;

    /// Writes only `field_paths` from `data` into an existing document.
    async fn update_document(
        &self,
        path: &ResourcePath,
        data: &MapValue,
        field_paths: &[FieldPath],
    ) -> FirestoreResult<WriteResult>;

    async fn delete_document(&self, path: &ResourcePath) -> FirestoreResult<()>;

    /// Creates a document with a backend-assigned id.
    async fn create_document(&self, collection: &ResourcePath, data: &MapValue) -> FirestoreResult<RemoteDocument>;

    async fn run_query(&self, request: &RunQueryRequest) -> FirestoreResult<Vec<RemoteDocument>>;

    /// Whether `run_query` can evaluate structured queries.
    fn supports_structured_query(&self) -> bool {
        true
    }
}

pub type DatastoreArc = Arc<dyn Datastore>;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait TokenProvider: Send + Sync + 'static {
    async fn get_token(&self) -> FirestoreResult<Option<String>>;
    fn invalidate_token(&self);
}

#[derive(Default, Clone)]
pub struct NoopTokenProvider;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl TokenProvider for NoopTokenProvider {
    async fn get_token(&self) -> FirestoreResult<Option<String>> {
        Ok(None)
    }

    fn invalidate_token(&self) {}
}

/// Hands out a fixed bearer token and refuses it once its `exp` claim has
/// passed. Opaque (non-JWT) tokens never expire.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    token: String,
    expires_at: Option<i64>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let expires_at = jwt::expiration_time(&token);
        Self { token, expires_at }
    }

    /// Expiry in seconds since the epoch, when the token carries one.
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Utc::now().timestamp() >= expires_at)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> FirestoreResult<Option<String>> {
        if self.is_expired() {
            log::warn!("firestore bearer token expired; refusing to send request");
            return Err(unauthenticated("Bearer token has expired"));
        }
        Ok(Some(self.token.clone()))
    }

    fn invalidate_token(&self) {}
}

pub type TokenProviderArc = Arc<dyn TokenProvider>;

pub use http::{HttpDatastore, HttpDatastoreBuilder};
pub use in_memory::InMemoryDatastore;
