use std::sync::Arc;
use std::time::Duration;

use crate::app::{FirebaseApp, FirebaseOptions};
use crate::firestore::constants::{DEFAULT_API_VERSION, DEFAULT_DATABASE_ID, DEFAULT_HOST, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::firestore::error::{missing_project_id, FirestoreResult};
use crate::firestore::model::{DatabaseId, IdentifierRules, PathPolicy, PathResolver};
use crate::firestore::remote::connection::ConnectionBuilder;
use crate::firestore::remote::datastore::{
    DatastoreArc, HttpDatastore, InMemoryDatastore, NoopTokenProvider, TokenProviderArc,
};

use super::query::QueryStrategy;
use super::reference::{CollectionReference, DocumentReference};

/// Client configuration. Nothing here is read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirestoreSettings {
    pub host: String,
    pub ssl: bool,
    pub api_version: String,
    pub database: String,
    pub request_timeout: Duration,
    pub path_policy: PathPolicy,
    pub identifier_rules: IdentifierRules,
    pub query_strategy: QueryStrategy,
}

impl Default for FirestoreSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            ssl: true,
            api_version: DEFAULT_API_VERSION.to_string(),
            database: DEFAULT_DATABASE_ID.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            path_policy: PathPolicy::default(),
            identifier_rules: IdentifierRules::default(),
            query_strategy: QueryStrategy::default(),
        }
    }
}

impl FirestoreSettings {
    /// Settings for a local emulator at `host` (`"localhost:8080"`), plain HTTP.
    pub fn emulator(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ssl: false,
            ..Self::default()
        }
    }
}

/// A client bound to one app, one database and one datastore.
#[derive(Clone)]
pub struct Firestore {
    inner: Arc<FirestoreInner>,
}

struct FirestoreInner {
    app: FirebaseApp,
    database_id: DatabaseId,
    settings: FirestoreSettings,
    resolver: PathResolver,
    datastore: DatastoreArc,
}

impl Firestore {
    /// Builds a client that talks to the REST endpoint described by `settings`
    /// without credentials.
    pub fn new(app: FirebaseApp, settings: FirestoreSettings) -> FirestoreResult<Self> {
        Self::with_auth_provider(app, settings, Arc::new(NoopTokenProvider))
    }

    /// Like [`Firestore::new`], attaching bearer tokens from `auth_provider`.
    pub fn with_auth_provider(
        app: FirebaseApp,
        settings: FirestoreSettings,
        auth_provider: TokenProviderArc,
    ) -> FirestoreResult<Self> {
        let database_id = database_id_for(&app, &settings)?;
        let connection = ConnectionBuilder::new()
            .with_host(settings.host.clone(), settings.ssl)
            .with_api_version(settings.api_version.clone());
        let datastore = HttpDatastore::builder(database_id)
            .with_connection_builder(connection)
            .with_auth_provider(auth_provider)
            .with_request_timeout(settings.request_timeout)
            .build()?;
        Self::with_datastore(app, settings, Arc::new(datastore))
    }

    /// Builds a client over any datastore implementation.
    pub fn with_datastore(app: FirebaseApp, settings: FirestoreSettings, datastore: DatastoreArc) -> FirestoreResult<Self> {
        let database_id = database_id_for(&app, &settings)?;
        let resolver = PathResolver::new(
            database_id.project_id(),
            settings.path_policy,
            settings.identifier_rules,
        );
        settings
            .identifier_rules
            .validate_project_id(database_id.project_id())?;
        Ok(Self {
            inner: Arc::new(FirestoreInner {
                app,
                database_id,
                settings,
                resolver,
                datastore,
            }),
        })
    }

    /// A client over a fresh [`InMemoryDatastore`], for tests and demos. The
    /// app it creates is not registered anywhere.
    pub fn in_memory(project_id: &str) -> FirestoreResult<Self> {
        let app = FirebaseApp::new(
            crate::app::DEFAULT_ENTRY_NAME,
            FirebaseOptions {
                project_id: Some(project_id.to_string()),
                ..Default::default()
            },
        );
        Self::with_datastore(app, FirestoreSettings::default(), Arc::new(InMemoryDatastore::new()))
    }

    pub fn app(&self) -> &FirebaseApp {
        &self.inner.app
    }

    pub fn database_id(&self) -> &DatabaseId {
        &self.inner.database_id
    }

    /// The default project for relative paths.
    pub fn project_id(&self) -> &str {
        self.inner.database_id.project_id()
    }

    pub fn settings(&self) -> &FirestoreSettings {
        &self.inner.settings
    }

    pub(crate) fn resolver(&self) -> &PathResolver {
        &self.inner.resolver
    }

    pub(crate) fn datastore(&self) -> &DatastoreArc {
        &self.inner.datastore
    }

    /// A reference to the document at `path` (`"users/alice"`), resolved with
    /// the client's path policy.
    pub fn doc(&self, path: &str) -> FirestoreResult<DocumentReference> {
        self.doc_in(path, None)
    }

    /// Like [`Firestore::doc`] with an explicit project overriding the default.
    pub fn doc_in(&self, path: &str, project: Option<&str>) -> FirestoreResult<DocumentReference> {
        let resolved = self.resolver().resolve_document(path, project)?;
        DocumentReference::new(self.clone(), resolved)
    }

    pub fn collection(&self, path: &str) -> FirestoreResult<CollectionReference> {
        self.collection_in(path, None)
    }

    pub fn collection_in(&self, path: &str, project: Option<&str>) -> FirestoreResult<CollectionReference> {
        let resolved = self.resolver().resolve_collection(path, project)?;
        CollectionReference::new(self.clone(), resolved)
    }
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("app", &self.inner.app.name())
            .field("database_id", &self.inner.database_id)
            .field("path_policy", &self.inner.settings.path_policy)
            .finish()
    }
}

fn database_id_for(app: &FirebaseApp, settings: &FirestoreSettings) -> FirestoreResult<DatabaseId> {
    let project_id = app.options().project_id.clone().ok_or_else(missing_project_id)?;
    Ok(DatabaseId::new(project_id, settings.database.clone()))
}

/// Free-function form of [`Firestore::doc_in`].
pub fn doc(firestore: &Firestore, path: &str, project: Option<&str>) -> FirestoreResult<DocumentReference> {
    firestore.doc_in(path, project)
}

/// Free-function form of [`Firestore::collection_in`].
pub fn collection(firestore: &Firestore, path: &str, project: Option<&str>) -> FirestoreResult<CollectionReference> {
    firestore.collection_in(path, project)
}
