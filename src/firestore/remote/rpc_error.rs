use reqwest::StatusCode;
use serde::Deserialize;

use crate::firestore::error::{
    already_exists, internal_error, invalid_argument, network_error, not_found, permission_denied,
    unauthenticated, unavailable, FirestoreError,
};

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleError>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: Option<String>,
}

/// Maps a non-2xx response onto an error kind.
pub fn map_http_error(status: StatusCode, body: &str) -> FirestoreError {
    let message = extract_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("HTTP error").to_string());
    let message = format!("HTTP {}: {message}", status.as_u16());
    match status {
        StatusCode::BAD_REQUEST => invalid_argument(message),
        StatusCode::UNAUTHORIZED => unauthenticated(message),
        StatusCode::FORBIDDEN => permission_denied(message),
        StatusCode::NOT_FOUND => not_found(message),
        StatusCode::CONFLICT => already_exists(message),
        StatusCode::SERVICE_UNAVAILABLE => unavailable(message),
        _ => internal_error(message),
    }
}

/// Maps a transport failure that never produced an HTTP status.
pub fn map_transport_error(err: &reqwest::Error) -> FirestoreError {
    if err.is_timeout() {
        return unavailable(format!("Request timed out: {err}"));
    }
    match err.status() {
        Some(status) => map_http_error(status, ""),
        None => network_error(err.to_string()),
    }
}

fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<GoogleErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|error| error.message)
        .filter(|message| !message.is_empty())
}
