//! Shared test utilities for the `hvcs` module.

use wiremock::{Mock, MockServer};

/// A wiremock server driven from synchronous tests.
///
/// The clients under test block on their own runtime, so the mock server
/// is started and configured on a separate one.
pub(crate) struct MockApi {
    server: MockServer,
    runtime: tokio::runtime::Runtime,
}

impl MockApi {
    pub(crate) fn start() -> Self {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub(crate) fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub(crate) fn uri(&self) -> String {
        self.server.uri()
    }
}
