pub(crate) const DEFAULT_DATABASE_ID: &str = "(default)";
pub(crate) const DEFAULT_HOST: &str = "firestore.googleapis.com";
pub(crate) const DEFAULT_API_VERSION: &str = "v1";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;

pub(crate) const AUTO_ID_LENGTH: usize = 20;

pub(crate) const MAX_DOCUMENT_ID_LENGTH: usize = 255;
pub(crate) const MAX_COLLECTION_NAME_LENGTH: usize = 255;
pub(crate) const MAX_PROJECT_ID_LENGTH: usize = 30;
pub(crate) const MAX_STRICT_PROJECT_ID_LENGTH: usize = 24;

/// Field names consulted, in order, when a wire record carries no resource name.
pub(crate) const ID_FIELD_CANDIDATES: [&str; 3] = ["id", "_id", "ID"];
