use httpmock::MockServer;

/// Start a fresh `httpmock::MockServer` for a unit test.
///
/// Panics when no local port can be bound; callers wrap it in
/// `catch_unwind` and skip the test in that case.
pub fn start_mock_server() -> MockServer {
    MockServer::start()
}
