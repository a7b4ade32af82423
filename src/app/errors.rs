use std::fmt;

use crate::firestore::error::{already_exists, invalid_argument, not_found, FirestoreError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    NoApp { app_name: String },
    BadAppName { app_name: String },
    DuplicateApp { app_name: String },
    NoOptions,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoApp { app_name } => {
                write!(f, "No Firebase App '{app_name}' has been created - call initialize_app() first")
            }
            AppError::BadAppName { app_name } => {
                write!(f, "Illegal App name: '{app_name}'")
            }
            AppError::DuplicateApp { app_name } => {
                write!(f, "Firebase App named '{app_name}' already exists")
            }
            AppError::NoOptions => write!(f, "Need to provide options with at least one value set"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<AppError> for FirestoreError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::DuplicateApp { .. } => already_exists(err.to_string()),
            AppError::NoApp { .. } => not_found(err.to_string()),
            AppError::BadAppName { .. } | AppError::NoOptions => invalid_argument(err.to_string()),
        }
    }
}
