//! Vault KV v2 secret source over plain HTTP

use crate::error::{Error, Result};
use crate::sources::SecretFetcher;
use crate::types::SecretMap;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use vaultenv_core::{SecretPath, VaultSettings, DEFAULT_VAULT_TIMEOUT_SECS};
use zeroize::Zeroizing;

/// Header carrying the Vault token
const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// `{ "data": { "data": { ... } } }`
#[derive(Debug, Deserialize)]
struct KvReadResponse {
    data: KvReadData,
}

#[derive(Debug, Deserialize)]
struct KvReadData {
    #[serde(default)]
    data: Option<serde_json::Map<String, serde_json::Value>>,
}

pub struct VaultKvSource {
    client: reqwest::Client,
    token: Zeroizing<String>,
}

impl VaultKvSource {
    /// Build a source from validated settings
    pub fn new(settings: &VaultSettings) -> Result<Self> {
        Self::with_options(&settings.token, settings.verify_tls, settings.timeout)
    }

    pub fn with_options(token: &str, verify_tls: bool, timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if !verify_tls {
            warn!(
                "TLS verification disabled for the secret store (custom.vault.ssl_check: false)"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            vaultenv_core::Error::invalid_config(format!("cannot build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            token: Zeroizing::new(token.to_string()),
        })
    }

    async fn read(&self, url: &Url) -> std::result::Result<SecretMap, String> {
        let response = self
            .client
            .get(url.clone())
            .header(VAULT_TOKEN_HEADER, self.token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("secret store returned HTTP {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {}", e))?;
        let parsed: KvReadResponse = serde_json::from_str(&body)
            .map_err(|e| format!("malformed secret store response: {}", e))?;

        parsed
            .data
            .data
            .map(|object| SecretMap::from_json_object(&object))
            .ok_or_else(|| "response has no data.data object".to_string())
    }
}

#[async_trait]
impl SecretFetcher for VaultKvSource {
    async fn fetch(&self, path: &SecretPath, url: &Url) -> Result<SecretMap> {
        debug!("Reading secrets for '{}' from {}", path, url);
        let secrets = self
            .read(url)
            .await
            .map_err(|cause| Error::secret_fetch(path.as_str(), cause))?;
        debug!("Read {} keys from '{}'", secrets.len(), path);
        Ok(secrets)
    }

    fn name(&self) -> &'static str {
        "vault"
    }
}

/// One-shot read of a single URL: `fetch(url, token, verifyTLS) -> SecretMap`
pub async fn fetch(url: &Url, token: &str, verify_tls: bool) -> Result<SecretMap> {
    let source = VaultKvSource::with_options(
        token,
        verify_tls,
        Duration::from_secs(DEFAULT_VAULT_TIMEOUT_SECS),
    )?;
    source
        .read(url)
        .await
        .map_err(|cause| Error::secret_fetch(url.path(), cause))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn warnings(&self) -> usize {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .filter(|l| l.contains("WARN"))
                .count()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, logs)
    }

    #[test]
    fn test_tls_off_warns_once_per_client() {
        let (source, logs) = with_captured_logs(|| {
            VaultKvSource::with_options("s.test", false, Duration::from_secs(5))
        });
        assert!(source.is_ok());
        assert_eq!(logs.warnings(), 1);
    }

    fn source() -> VaultKvSource {
        VaultKvSource::with_options("s.test", true, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_token_and_reads_nested_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/data/app"))
            .and(header("X-Vault-Token", "s.test"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "data": { "DB_PASS": "x", "PORT": 5432 }, "metadata": { "version": 3 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let secret_path = SecretPath::parse("secret/app").unwrap();
        let base = Url::parse(&server.uri()).unwrap();
        let url = secret_path.request_url(&base).unwrap();

        let secrets = source().fetch(&secret_path, &url).await.unwrap();
        assert_eq!(secrets.get("DB_PASS").unwrap().expose(), "x");
        assert_eq!(secrets.get("PORT").unwrap().expose(), "5432");
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_secret_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let secret_path = SecretPath::parse("secret/app").unwrap();
        let url = secret_path
            .request_url(&Url::parse(&server.uri()).unwrap())
            .unwrap();

        let err = source().fetch(&secret_path, &url).await.unwrap_err();
        match err {
            Error::SecretFetch { path, cause } => {
                assert_eq!(path, "secret/app");
                assert!(cause.contains("403"), "got: {}", cause);
            }
            other => panic!("expected SecretFetch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/v1/secret/data/app", server.uri())).unwrap();
        let err = fetch(&url, "s.test", true).await.unwrap_err();
        assert!(err.to_string().contains("malformed"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_fetch_missing_inner_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "data": null } })),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/v1/secret/data/gone", server.uri())).unwrap();
        let err = fetch(&url, "s.test", true).await.unwrap_err();
        assert!(matches!(err, Error::SecretFetch { .. }));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_server() {
        let url = Url::parse("http://127.0.0.1:9/v1/secret/data/app").unwrap();
        let err = fetch(&url, "s.test", true).await.unwrap_err();
        assert!(matches!(err, Error::SecretFetch { .. }));
    }
}
