mod database_id;
mod field_path;
mod identifiers;
mod path_resolver;
mod resource_path;
mod timestamp;

pub use database_id::DatabaseId;
pub use field_path::{FieldPath, IntoFieldPath};
pub use identifiers::IdentifierRules;
pub use path_resolver::{PathPolicy, PathResolver};
pub use resource_path::ResourcePath;
pub use timestamp::Timestamp;
