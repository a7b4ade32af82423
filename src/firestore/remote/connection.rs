use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::firestore::constants::{DEFAULT_API_VERSION, DEFAULT_HOST};
use crate::firestore::error::{internal_error, invalid_argument, FirestoreResult};

use super::rpc_error::{map_http_error, map_transport_error};

// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// HTTP transport rooted at `{scheme}://{host}/{api_version}`.
#[derive(Clone, Debug)]
pub struct Connection {
    client: Client,
    base_url: String,
}

#[derive(Clone, Debug)]
pub struct ConnectionBuilder {
    client: Option<Client>,
    host: String,
    ssl: bool,
    api_version: String,
}

#[derive(Default, Clone, Debug)]
pub struct RequestContext {
    pub auth_token: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            host: DEFAULT_HOST.to_string(),
            ssl: true,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>, ssl: bool) -> Self {
        self.host = host.into();
        self.ssl = ssl;
        self
    }

    /// Points the connection at a local emulator over plain HTTP.
    pub fn with_emulator_host(self, host: impl Into<String>) -> Self {
        self.with_host(host, false)
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn build(self) -> FirestoreResult<Connection> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .build()
                .map_err(|err| internal_error(err.to_string()))?,
        };
        let base_url = build_base_url(&self.host, self.ssl, &self.api_version)?;
        Ok(Connection { client, base_url })
    }
}

impl Connection {
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request and returns the decoded JSON body. Empty or non-JSON
    /// success bodies are returned as `{}`.
    pub async fn invoke_json(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<JsonValue>,
        context: &RequestContext,
    ) -> FirestoreResult<JsonValue> {
        let mut request = self.build_request(method.clone(), path, context);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        log::debug!("firestore request: {method} {path}");
        let response = request.send().await.map_err(|err| map_transport_error(&err))?;
        let status = response.status();
        let text = response.text().await.map_err(|err| map_transport_error(&err))?;

        if !status.is_success() {
            log::debug!("firestore response: {method} {path} -> {status}");
            return Err(map_http_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(err) => {
                log::debug!("firestore response for {path} is not JSON ({err}); treating as empty");
                Ok(json!({}))
            }
        }
    }

    fn build_request(&self, method: Method, path: &str, context: &RequestContext) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut builder = self.client.request(method, url);
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(timeout) = context.request_timeout {
                builder = builder.timeout(timeout);
            }
        }
        if let Some(token) = context.auth_token.as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder.header("Content-Type", "application/json")
    }
}

/// Percent-encodes one path segment for use in a request path.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

fn build_base_url(host: &str, ssl: bool, api_version: &str) -> FirestoreResult<String> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() || host.contains("://") {
        return Err(invalid_argument(format!(
            "Host '{host}' must be a bare host name with optional port"
        )));
    }
    let scheme = if ssl { "https" } else { "http" };
    let candidate = format!("{scheme}://{host}/{}", api_version.trim_matches('/'));
    let parsed = Url::parse(&candidate)
        .map_err(|err| invalid_argument(format!("Invalid host '{host}': {err}")))?;
    if parsed.host_str().is_none() {
        return Err(invalid_argument(format!("Invalid host '{host}'")));
    }
    Ok(candidate)
}
