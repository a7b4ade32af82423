use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value as JsonValue};

use crate::firestore::api::snapshot::{DocumentIdSource, WriteResult};
use crate::firestore::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::firestore::error::{internal_error, FirestoreErrorCode, FirestoreResult};
use crate::firestore::model::{DatabaseId, FieldPath, ResourcePath, Timestamp};
use crate::firestore::remote::connection::{encode_segment, Connection, ConnectionBuilder, RequestContext};
use crate::firestore::remote::serializer::JsonProtoSerializer;
use crate::firestore::value::MapValue;

use super::{Datastore, NoopTokenProvider, RemoteDocument, RunQueryRequest, TokenProviderArc};

const LIST_PAGE_SIZE: &str = "300";

/// Datastore speaking the Firestore REST API. Requests are issued once;
/// failures surface to the caller without retries.
#[derive(Clone)]
pub struct HttpDatastore {
    connection: Connection,
    serializer: JsonProtoSerializer,
    auth_provider: TokenProviderArc,
    request_timeout: Duration,
}

#[derive(Clone)]
pub struct HttpDatastoreBuilder {
    database_id: DatabaseId,
    connection_builder: ConnectionBuilder,
    auth_provider: TokenProviderArc,
    request_timeout: Duration,
}

impl HttpDatastore {
    pub fn builder(database_id: DatabaseId) -> HttpDatastoreBuilder {
        HttpDatastoreBuilder::new(database_id)
    }

    pub fn from_database_id(database_id: DatabaseId) -> FirestoreResult<Self> {
        Self::builder(database_id).build()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn request_context(&self) -> FirestoreResult<RequestContext> {
        Ok(RequestContext {
            auth_token: self.auth_provider.get_token().await?,
            request_timeout: Some(self.request_timeout),
        })
    }

    async fn invoke(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<JsonValue>,
    ) -> FirestoreResult<JsonValue> {
        let context = self.request_context().await?;
        let result = self.connection.invoke_json(method, path, query, body, &context).await;
        if let Err(err) = &result {
            if err.code == FirestoreErrorCode::Unauthenticated {
                self.auth_provider.invalidate_token();
            }
        }
        result
    }

    /// Request path for a project-qualified document or collection path.
    fn request_path(&self, path: &ResourcePath) -> String {
        let mut request_path = format!("{}/documents", self.serializer.database_name(path));
        for segment in path.pop_first().iter() {
            request_path.push('/');
            request_path.push_str(&encode_segment(segment));
        }
        request_path
    }

    fn write_result(response: &JsonValue) -> FirestoreResult<WriteResult> {
        let update_time = match response.get("updateTime").and_then(JsonValue::as_str) {
            Some(value) => Timestamp::parse_rfc3339(value)?,
            None => Timestamp::now(),
        };
        Ok(WriteResult::new(update_time))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Datastore for HttpDatastore {
    async fn get_document(&self, path: &ResourcePath) -> FirestoreResult<RemoteDocument> {
        let response = self.invoke(Method::GET, &self.request_path(path), &[], None).await?;
        self.serializer.decode_document_at(&response, path)
    }

    async fn list_documents(&self, collection: &ResourcePath) -> FirestoreResult<Vec<RemoteDocument>> {
        let request_path = self.request_path(collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize".to_string(), LIST_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken".to_string(), token.clone()));
            }
            let response = self.invoke(Method::GET, &request_path, &query, None).await?;

            if let Some(records) = response.get("documents").and_then(JsonValue::as_array) {
                for record in records {
                    let index = documents.len();
                    documents.push(self.serializer.decode_document(record, collection, index)?);
                }
            }

            let next = response
                .get("nextPageToken")
                .and_then(JsonValue::as_str)
                .filter(|token| !token.is_empty())
                .map(str::to_string);
            match next {
                Some(token) if page_token.as_deref() == Some(token.as_str()) => {
                    log::warn!("list of '{collection}' returned the same page token twice; stopping");
                    break;
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("listed {} documents from '{collection}'", documents.len());
        Ok(documents)
    }

    async fn set_document(&self, path: &ResourcePath, data: &MapValue) -> FirestoreResult<WriteResult> {
        let body = self.serializer.encode_document_fields(data)?;
        let response = self
            .invoke(Method::PATCH, &self.request_path(path), &[], Some(body))
            .await?;
        Self::write_result(&response)
    }

    async fn update_document(
        &self,
        path: &ResourcePath,
        data: &MapValue,
        field_paths: &[FieldPath],
    ) -> FirestoreResult<WriteResult> {
        let body = self.serializer.encode_document_fields(data)?;
        let mut query: Vec<(String, String)> = field_paths
            .iter()
            .map(|field_path| ("updateMask.fieldPaths".to_string(), self.serializer.field_path(field_path)))
            .collect();
        query.push(("currentDocument.exists".to_string(), "true".to_string()));
        let response = self
            .invoke(Method::PATCH, &self.request_path(path), &query, Some(body))
            .await?;
        Self::write_result(&response)
    }

    async fn delete_document(&self, path: &ResourcePath) -> FirestoreResult<()> {
        self.invoke(Method::DELETE, &self.request_path(path), &[], None)
            .await
            .map(|_| ())
    }

    async fn create_document(&self, collection: &ResourcePath, data: &MapValue) -> FirestoreResult<RemoteDocument> {
        let body = self.serializer.encode_document_fields(data)?;
        let response = self
            .invoke(Method::POST, &self.request_path(collection), &[], Some(body))
            .await?;
        let mut document = self.serializer.decode_document(&response, collection, 0)?;
        if document.id_source == DocumentIdSource::Synthesized {
            return Err(internal_error(format!(
                "Create response for '{collection}' did not carry a document name"
            )));
        }
        if document.fields.is_empty() {
            document.fields = data.clone();
        }
        Ok(document)
    }

    async fn run_query(&self, request: &RunQueryRequest) -> FirestoreResult<Vec<RemoteDocument>> {
        let parent = request.collection.without_last();
        let body = json!({
            "structuredQuery": request.structured_query,
            "parent": self.serializer.resource_name(&parent),
        });
        let request_path = format!("{}:runQuery", self.request_path(&parent));
        let response = self.invoke(Method::POST, &request_path, &[], Some(body)).await?;

        let mut documents = Vec::new();
        if let Some(entries) = response.as_array() {
            for entry in entries {
                if let Some(record) = entry.get("document") {
                    let index = documents.len();
                    documents.push(self.serializer.decode_document(record, &request.collection, index)?);
                }
            }
        }
        log::debug!("runQuery on '{}' returned {} documents", request.collection, documents.len());
        Ok(documents)
    }
}

impl HttpDatastoreBuilder {
    fn new(database_id: DatabaseId) -> Self {
        let auth_provider: TokenProviderArc = Arc::new(NoopTokenProvider);
        Self {
            database_id,
            connection_builder: Connection::builder(),
            auth_provider,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    pub fn with_auth_provider(mut self, provider: TokenProviderArc) -> Self {
        self.auth_provider = provider;
        self
    }

    pub fn with_connection_builder(mut self, builder: ConnectionBuilder) -> Self {
        self.connection_builder = builder;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> FirestoreResult<HttpDatastore> {
        Ok(HttpDatastore {
            connection: self.connection_builder.build()?,
            serializer: JsonProtoSerializer::new(self.database_id),
            auth_provider: self.auth_provider,
            request_timeout: self.request_timeout,
        })
    }
}
