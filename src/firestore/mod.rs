//! Path-addressed document access over the Firestore REST API.
//!
//! Paths resolve to project-qualified references, references read and write
//! documents through a [`remote::Datastore`], and queries run either as a
//! server-side structured query or client-side over a fetched collection.
pub mod api;
mod constants;
pub mod error;
pub mod model;
mod query_evaluator;
pub mod remote;
pub mod value;

pub use api::{
    collection, doc, limit, order_by, query, where_field, CollectionReference, DocumentIdSource,
    DocumentReference, DocumentSnapshot, FilterOperator, Firestore, FirestoreSettings, OrderDirection, Query,
    QueryConstraint, QueryDocumentSnapshot, QuerySnapshot, QueryStrategy, SetOptions, WriteResult,
};
pub use error::{FirestoreError, FirestoreErrorCode, FirestoreResult};
pub use model::{DatabaseId, FieldPath, IdentifierRules, PathPolicy, Timestamp};
pub use value::{FirestoreValue, MapValue};
