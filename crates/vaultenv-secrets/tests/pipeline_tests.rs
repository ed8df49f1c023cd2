//! End-to-end tests for the deploy phases
//!
//! Tests cover:
//! - Declared keys found / not found, with diagnostics
//! - KMS encryption of resolved values
//! - Secret store errors failing the phase without writing the config
//! - Multi-path merge order against a real HTTP server

mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use vaultenv_secrets::{
    Diagnostic, DeployHooks, Error, KeyStatus, Phase, PluginOptions, VaultEnvPlugin,
};
use wiremock::MockServer;

fn enabled() -> PluginOptions {
    PluginOptions {
        enabled: true,
        ..PluginOptions::default()
    }
}

#[tokio::test]
async fn test_found_and_not_found_without_kms() {
    let server = MockServer::start().await;
    mock_kv_secret(&server, "/v1/secret/data/app", json!({ "DB_PASS": "x" })).await;

    let mut config = deploy_config(&server.uri(), &["secret/app"], &["DB_PASS", "OTHER"], None);
    let backends = TestBackends::new(FakeKms::returning(b"unused"));
    let plugin = VaultEnvPlugin::with_backends(enabled(), backends.clone());

    let outcome = plugin.before_package(&mut config).await.unwrap();

    assert_eq!(outcome.phase, Phase::Package);
    assert!(!outcome.encrypted);
    assert_eq!(
        outcome.environment.to_pairs(),
        vec![("DB_PASS".to_string(), "x".to_string())]
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::not_found("OTHER")));
    assert_eq!(
        outcome
            .diagnostics
            .iter()
            .find(|d| d.key == "OTHER")
            .map(|d| d.to_string())
            .unwrap(),
        "OTHER -> NOT_FOUND"
    );
    assert!(backends.kms.calls().is_empty());

    let declared = config.environment_declaration().unwrap();
    assert_eq!(declared.iter().collect::<Vec<_>>(), vec!["DB_PASS"]);
    assert!(config.to_yaml().unwrap().contains("handler: handler.main"));
}

#[tokio::test]
async fn test_kms_encrypts_resolved_values() {
    let server = MockServer::start().await;
    mock_kv_secret(&server, "/v1/secret/data/app", json!({ "DB_PASS": "x" })).await;

    let mut config = deploy_config(
        &server.uri(),
        &["secret/app"],
        &["DB_PASS", "OTHER"],
        Some("alias/orders"),
    );
    let backends = TestBackends::new(FakeKms::returning(b"cipher"));
    let plugin = VaultEnvPlugin::with_backends(enabled(), backends.clone());

    let outcome = plugin.before_offline_start(&mut config).await.unwrap();

    assert!(outcome.encrypted);
    assert_eq!(
        outcome.environment.to_pairs(),
        vec![("DB_PASS".to_string(), "Y2lwaGVy".to_string())]
    );
    assert_eq!(
        backends.kms.calls(),
        vec![("alias/orders".to_string(), "x".to_string())]
    );

    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("Y2lwaGVy"));
    assert!(!yaml.contains("DB_PASS: x"));
}

#[tokio::test]
async fn test_empty_value_kept_unencrypted_with_kms() {
    let server = MockServer::start().await;
    mock_kv_secret(
        &server,
        "/v1/secret/data/app",
        json!({ "DB_PASS": "x", "FEATURE_FLAGS": "" }),
    )
    .await;

    let mut config = deploy_config(
        &server.uri(),
        &["secret/app"],
        &["DB_PASS", "FEATURE_FLAGS"],
        Some("alias/orders"),
    );
    let backends = TestBackends::new(FakeKms::returning(b"cipher"));
    let plugin = VaultEnvPlugin::with_backends(enabled(), backends.clone());

    let outcome = plugin.before_package(&mut config).await.unwrap();

    assert!(outcome.encrypted);
    assert_eq!(
        outcome.environment.to_pairs(),
        vec![
            ("DB_PASS".to_string(), "Y2lwaGVy".to_string()),
            ("FEATURE_FLAGS".to_string(), String::new()),
        ]
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::found("FEATURE_FLAGS")));
    assert_eq!(
        backends.kms.calls(),
        vec![("alias/orders".to_string(), "x".to_string())]
    );
}

#[tokio::test]
async fn test_kms_region_defaults_to_us_east_1() {
    let server = MockServer::start().await;
    mock_kv_secret(&server, "/v1/secret/data/app", json!({ "A": "1" })).await;

    let mut config = deploy_config(&server.uri(), &["secret/app"], &["A"], Some("alias/k"));
    let backends = TestBackends::new(FakeKms::returning(b"c"));
    let plugin = VaultEnvPlugin::with_backends(enabled(), backends.clone());
    plugin.before_package(&mut config).await.unwrap();

    let settings = backends.kms_settings.lock().unwrap().clone().unwrap();
    assert_eq!(settings.region, "us-east-1");
    assert_eq!(settings.timeout, Duration::from_secs(15));
}

#[tokio::test]
async fn test_forbidden_fails_without_writing() {
    let server = MockServer::start().await;
    mock_kv_status(&server, "/v1/secret/data/app", 403).await;

    let mut config = deploy_config(&server.uri(), &["secret/app"], &["DB_PASS", "OTHER"], None);
    let before = config.to_yaml().unwrap();
    let plugin =
        VaultEnvPlugin::with_backends(enabled(), TestBackends::new(FakeKms::returning(b"c")));

    let err = plugin.before_package(&mut config).await.unwrap_err();

    match err {
        Error::SecretFetch { path, cause } => {
            assert_eq!(path, "secret/app");
            assert!(cause.contains("403"), "got: {}", cause);
        }
        other => panic!("expected SecretFetch, got {:?}", other),
    }
    assert_eq!(config.to_yaml().unwrap(), before);
}

#[tokio::test]
async fn test_encryption_failure_fails_whole_batch() {
    let server = MockServer::start().await;
    mock_kv_secret(
        &server,
        "/v1/secret/data/app",
        json!({ "A": "fine", "B": "refused" }),
    )
    .await;

    let mut config = deploy_config(&server.uri(), &["secret/app"], &["A", "B"], Some("alias/k"));
    let before = config.to_yaml().unwrap();
    let plugin = VaultEnvPlugin::with_backends(
        enabled(),
        TestBackends::new(FakeKms::returning(b"c").failing_on("refused")),
    );

    let err = plugin.before_package(&mut config).await.unwrap_err();
    assert!(matches!(err, Error::Encryption { ref key, .. } if key == "B"));
    assert_eq!(config.to_yaml().unwrap(), before);
}

#[tokio::test]
async fn test_later_path_wins_over_http() {
    let server = MockServer::start().await;
    // The earlier path answers last
    mock_kv_secret_delayed(
        &server,
        "/v1/secret/data/common",
        json!({ "DB_PASS": "common", "REGION": "eu" }),
        Duration::from_millis(200),
    )
    .await;
    mock_kv_secret(
        &server,
        "/v1/kv/data/orders/prod",
        json!({ "DB_PASS": "orders", "PORT": 5432 }),
    )
    .await;

    let mut config = deploy_config(
        &server.uri(),
        &["secret/common", "kv/orders/prod"],
        &["DB_PASS", "REGION", "PORT"],
        None,
    );
    let plugin =
        VaultEnvPlugin::with_backends(enabled(), TestBackends::new(FakeKms::returning(b"c")));

    let outcome = plugin.before_package(&mut config).await.unwrap();
    assert_eq!(
        outcome.environment.to_pairs(),
        vec![
            ("DB_PASS".to_string(), "orders".to_string()),
            ("REGION".to_string(), "eu".to_string()),
            ("PORT".to_string(), "5432".to_string()),
        ]
    );
    assert!(outcome
        .diagnostics
        .iter()
        .all(|d| d.status == KeyStatus::Found));
}

#[tokio::test]
async fn test_deadline_covers_slow_secret_store() {
    let server = MockServer::start().await;
    mock_kv_secret_delayed(
        &server,
        "/v1/secret/data/app",
        json!({ "A": "1" }),
        Duration::from_secs(5),
    )
    .await;

    let mut config = deploy_config(&server.uri(), &["secret/app"], &["A"], None);
    let plugin = VaultEnvPlugin::with_backends(
        PluginOptions {
            enabled: true,
            deadline: Duration::from_millis(200),
            ..PluginOptions::default()
        },
        TestBackends::new(FakeKms::returning(b"c")),
    );

    let err = plugin.before_package(&mut config).await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded(_)));
}
