//! Test utilities shared across crate-level unit tests.

pub mod firebase;
pub mod http;

pub use firebase::test_firebase_app;
pub use http::start_mock_server;
