use crate::firestore::constants::{
    MAX_COLLECTION_NAME_LENGTH, MAX_DOCUMENT_ID_LENGTH, MAX_PROJECT_ID_LENGTH,
    MAX_STRICT_PROJECT_ID_LENGTH,
};
use crate::firestore::error::{invalid_argument, FirestoreResult};

/// Character set and length rules applied to path identifiers before any
/// request is issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdentifierRules {
    /// Project ids up to 30 characters, URL-safe collection names.
    #[default]
    Permissive,
    /// Project ids up to 24 characters without leading/trailing hyphens and
    /// collection names restricted to `[a-z0-9_]`.
    Strict,
}

impl IdentifierRules {
    pub fn validate_project_id(&self, value: &str) -> FirestoreResult<()> {
        let max = match self {
            IdentifierRules::Permissive => MAX_PROJECT_ID_LENGTH,
            IdentifierRules::Strict => MAX_STRICT_PROJECT_ID_LENGTH,
        };
        check_length("Project id", value, max)?;
        check_charset("Project id", value, is_url_safe)?;
        if *self == IdentifierRules::Strict && (value.starts_with('-') || value.ends_with('-')) {
            return Err(invalid_argument(format!(
                "Project id '{value}' must not start or end with '-'"
            )));
        }
        Ok(())
    }

    pub fn validate_document_id(&self, value: &str) -> FirestoreResult<()> {
        check_length("Document id", value, MAX_DOCUMENT_ID_LENGTH)?;
        check_charset("Document id", value, is_url_safe)
    }

    pub fn validate_collection_name(&self, value: &str) -> FirestoreResult<()> {
        check_length("Collection name", value, MAX_COLLECTION_NAME_LENGTH)?;
        match self {
            IdentifierRules::Permissive => check_charset("Collection name", value, is_url_safe),
            IdentifierRules::Strict => check_charset("Collection name", value, |c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
            }),
        }
    }
}

fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn check_length(label: &str, value: &str, max: usize) -> FirestoreResult<()> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(invalid_argument(format!(
            "{label} '{value}' must be between 1 and {max} characters"
        )));
    }
    Ok(())
}

fn check_charset(label: &str, value: &str, allowed: impl Fn(char) -> bool) -> FirestoreResult<()> {
    match value.chars().find(|c| !allowed(*c)) {
        Some(bad) => Err(invalid_argument(format!(
            "{label} '{value}' contains invalid character '{bad}'"
        ))),
        None => Ok(()),
    }
}
