mod lifecycle_tests;

use crate::{Credentials, MockConnection, MockShellTransport, Server};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Unwraps a `json!` object literal.
pub(super) fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// A server with mocked collaborators and no configured key paths.
pub(super) fn create_test_server(
    connection: MockConnection,
    shell: MockShellTransport,
) -> Server {
    Server::new(Arc::new(connection), Arc::new(shell)).with_credentials(Credentials::default())
}

/// A server that already exists remotely at 10.0.0.1.
pub(super) fn create_live_server(
    connection: MockConnection,
    shell: MockShellTransport,
) -> Server {
    let mut server = create_test_server(connection, shell);
    server
        .attributes_mut()
        .merge(object(serde_json::json!({
            "id": "b-1",
            "status": "running",
            "ips": [{"address": "10.0.0.1"}]
        })))
        .unwrap();
    server
}
