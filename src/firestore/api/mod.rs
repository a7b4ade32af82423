mod database;
pub(crate) mod operations;
pub(crate) mod query;
pub(crate) mod reference;
pub(crate) mod snapshot;

pub use database::{collection, doc, Firestore, FirestoreSettings};
pub use operations::SetOptions;
pub use query::{
    limit, order_by, query, where_field, FieldFilter, FilterOperator, OrderBy, OrderDirection, Query,
    QueryConstraint, QuerySnapshot, QueryStrategy,
};
pub use reference::{CollectionReference, DocumentReference};
pub use snapshot::{DocumentIdSource, DocumentSnapshot, QueryDocumentSnapshot, WriteResult};
