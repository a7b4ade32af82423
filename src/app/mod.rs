//! Named app configuration and the caller-owned registry that holds it.
mod constants;
mod errors;
mod registry;
mod types;

#[doc(inline)]
pub use constants::DEFAULT_ENTRY_NAME;

#[doc(inline)]
pub use errors::{AppError, AppResult};

#[doc(inline)]
pub use registry::AppRegistry;

#[doc(inline)]
pub use types::{FirebaseApp, FirebaseAppSettings, FirebaseOptions};
