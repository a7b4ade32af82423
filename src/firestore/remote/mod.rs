pub mod connection;
pub mod datastore;
pub mod rpc_error;
pub mod serializer;
pub(crate) mod structured_query;

pub use connection::{Connection, ConnectionBuilder, RequestContext};
pub use datastore::{
    Datastore, DatastoreArc, HttpDatastore, HttpDatastoreBuilder, InMemoryDatastore, NoopTokenProvider,
    RemoteDocument, RunQueryRequest, StaticTokenProvider, TokenProvider, TokenProviderArc,
};
pub use rpc_error::{map_http_error, map_transport_error};
pub use serializer::JsonProtoSerializer;
