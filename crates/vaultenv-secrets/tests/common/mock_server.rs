//! Wiremock setup helpers for the secret store

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "s.integration-token";

/// Serve `data` as the KV v2 secret at `/v1/<mount>/data/<subpath>`
pub async fn mock_kv_secret(server: &MockServer, request_path: &str, data: Value) {
    mock_kv_secret_delayed(server, request_path, data, Duration::ZERO).await;
}

/// Same as [`mock_kv_secret`] but the response is held back for `delay`
pub async fn mock_kv_secret_delayed(
    server: &MockServer,
    request_path: &str,
    data: Value,
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(request_path))
        .and(header("X-Vault-Token", TEST_TOKEN))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "data": data, "metadata": { "version": 1 } } }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Answer `request_path` with a bare status code
pub async fn mock_kv_status(server: &MockServer, request_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(request_path))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({ "errors": ["permission denied"] })),
        )
        .mount(server)
        .await;
}
