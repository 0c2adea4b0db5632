//! Unit tests for the Forge client

use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Counts how many connections the client asks for
struct CountingProvider {
    inner: ConnectionBuilder,
    builds: Arc<AtomicUsize>,
}

impl CountingProvider {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        let provider = Self {
            inner: ConnectionBuilder::new(),
            builds: builds.clone(),
        };
        (provider, builds)
    }
}

impl ConnectionProvider for CountingProvider {
    fn connect(&self, base_url: &str) -> RegistryResult<Connection> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.inner.connect(base_url)
    }
}

/// Counts WARN events
#[derive(Clone, Default)]
struct WarningCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for WarningCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn module_body(releases: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "slug": "adrien-boolean",
        "name": "boolean",
        "releases": releases,
    })
}

async fn mount_module(server: &MockServer, slug: &str, releases: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v3/modules/{}", slug)))
        .respond_with(ResponseTemplate::new(200).set_body_json(module_body(releases)))
        .mount(server)
        .await;
}

#[test]
fn test_client_defaults_to_canonical_forge() {
    let client = ForgeClient::new();
    assert_eq!(client.endpoint().host(), DEFAULT_FORGE);
    assert_eq!(client.endpoint().base_url(), "https://forgeapi.puppetlabs.com");
}

#[test]
fn test_endpoint_parsing() {
    let bare = Endpoint::parse("forgeapi.puppetlabs.com").unwrap();
    assert_eq!(bare.scheme(), "https");
    assert_eq!(bare.base_url(), "https://forgeapi.puppetlabs.com");

    let with_port = Endpoint::parse("http://127.0.0.1:8140").unwrap();
    assert_eq!(with_port.port(), Some(8140));
    assert_eq!(with_port.base_url(), "http://127.0.0.1:8140");

    let with_prefix = Endpoint::parse("https://artifacts.example.com/api/forge/").unwrap();
    assert_eq!(with_prefix.base_url(), "https://artifacts.example.com/api/forge");

    assert!(Endpoint::parse("").is_err());
    assert!(Endpoint::parse("ftp://forge.example.com").is_err());
    assert!(Endpoint::parse("https://").is_err());
}

#[test]
fn test_legacy_host_is_rewritten_with_one_warning() {
    for legacy in ["forge.puppetlabs.com", "https://forge.puppetlabs.com"] {
        let counter = WarningCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());

        let client = tracing::subscriber::with_default(subscriber, || ForgeClient::with_host(legacy))
            .unwrap();

        assert_eq!(client.endpoint(), &Endpoint::canonical());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_current_host_emits_no_warning() {
    let counter = WarningCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());

    let client = tracing::subscriber::with_default(subscriber, || {
        ForgeClient::with_host("forgeapi.puppetlabs.com")
    })
    .unwrap();

    assert_eq!(client.endpoint().host(), DEFAULT_FORGE);
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_versions_oldest_to_newest() {
    let mock_server = MockServer::start().await;
    mount_module(
        &mock_server,
        "adrien-boolean",
        serde_json::json!([
            { "version": "0.9.0", "deleted_at": null },
            { "version": "1.0.0", "deleted_at": null },
            { "version": "0.9.0-rc1", "deleted_at": null }
        ]),
    )
    .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();

    let versions = client.versions("adrien/boolean").await.unwrap();
    assert_eq!(versions, vec!["0.9.0-rc1", "0.9.0", "1.0.0"]);

    let latest = client.latest_version("adrien/boolean").await.unwrap();
    assert_eq!(latest.as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn test_versions_reverses_registry_order() {
    let mock_server = MockServer::start().await;
    mount_module(
        &mock_server,
        "adrien-boolean",
        serde_json::json!([
            { "version": "1.0.1", "deleted_at": null },
            { "version": "1.0.0", "deleted_at": null },
            { "version": "0.9.0", "deleted_at": null },
            { "version": "0.9.0-rc1", "deleted_at": null }
        ]),
    )
    .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    let versions = client.versions("adrien/boolean").await.unwrap();
    assert_eq!(versions, vec!["0.9.0-rc1", "0.9.0", "1.0.0", "1.0.1"]);
    assert_eq!(
        client.latest_version("adrien/boolean").await.unwrap().as_ref(),
        versions.last()
    );
}

#[tokio::test]
async fn test_versions_skip_deleted_releases() {
    let mock_server = MockServer::start().await;
    mount_module(
        &mock_server,
        "adrien-boolean",
        serde_json::json!([
            { "version": "1.0.0", "deleted_at": null },
            { "version": "0.9.0", "deleted_at": "2020-01-01" }
        ]),
    )
    .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    assert_eq!(client.versions("adrien/boolean").await.unwrap(), vec!["1.0.0"]);

    let releases = client.releases("adrien/boolean").await.unwrap();
    assert_eq!(releases.len(), 1);
    assert!(releases.iter().all(|r| !r.is_deleted()));
}

#[tokio::test]
async fn test_module_without_releases() {
    let mock_server = MockServer::start().await;
    mount_module(&mock_server, "adrien-empty", serde_json::json!([])).await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    assert!(client.versions("adrien/empty").await.unwrap().is_empty());
    assert_eq!(client.latest_version("adrien/empty").await.unwrap(), None);
}

#[tokio::test]
async fn test_module_with_only_deleted_releases() {
    let mock_server = MockServer::start().await;
    mount_module(
        &mock_server,
        "adrien-gone",
        serde_json::json!([{ "version": "1.0.0", "deleted_at": "2019-03-01" }]),
    )
    .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    assert_eq!(client.latest_version("adrien/gone").await.unwrap(), None);
}

#[tokio::test]
async fn test_module_name_normalization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/modules/author-modname"))
        .respond_with(ResponseTemplate::new(200).set_body_json(module_body(serde_json::json!([
            { "version": "2.1.0", "deleted_at": null }
        ]))))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    assert_eq!(client.versions("author/modname").await.unwrap(), vec!["2.1.0"]);
    assert_eq!(client.versions("author-modname").await.unwrap(), vec!["2.1.0"]);
}

#[tokio::test]
async fn test_not_found_raises_registry_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/modules/nobody-nothing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    let err = client.versions("nobody/nothing").await.unwrap_err();

    match &err {
        ForgeError::Registry { path, status, .. } => {
            assert_eq!(path, "/v3/modules/nobody-nothing");
            assert_eq!(*status, 404);
        },
        other => panic!("Expected Registry error, got {:?}", other),
    }
    assert!(err.to_string().contains("/v3/modules/nobody-nothing"));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_server_error_raises_registry_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/modules/adrien-boolean"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    let err = client.latest_version("adrien/boolean").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.path(), Some("/v3/modules/adrien-boolean"));
}

#[tokio::test]
async fn test_unexpected_body_shape_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/modules/adrien-boolean"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })))
        .mount(&mock_server)
        .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    let err = client.versions("adrien/boolean").await.unwrap_err();
    assert!(matches!(err, ForgeError::Decode { .. }));
}

#[tokio::test]
async fn test_non_json_response_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/modules/adrien-boolean"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    let err = client.versions("adrien/boolean").await.unwrap_err();
    assert!(matches!(err, ForgeError::Decode { .. }));
}

#[tokio::test]
async fn test_invalid_module_name_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = ForgeClient::with_host(&mock_server.uri()).unwrap();
    let err = client.versions("").await.unwrap_err();
    assert!(matches!(err, ForgeError::InvalidModuleName { .. }));
}

#[tokio::test]
async fn test_connection_is_built_once() {
    let mock_server = MockServer::start().await;
    mount_module(
        &mock_server,
        "adrien-boolean",
        serde_json::json!([{ "version": "1.0.0", "deleted_at": null }]),
    )
    .await;

    let (provider, builds) = CountingProvider::new();
    let client = ForgeClient::with_provider(&mock_server.uri(), provider).unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    client.versions("adrien/boolean").await.unwrap();
    client.versions("adrien/boolean").await.unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(std::ptr::eq(
        client.connection().unwrap(),
        client.connection().unwrap()
    ));
}

#[tokio::test]
async fn test_concurrent_first_use_builds_once() {
    let mock_server = MockServer::start().await;
    mount_module(
        &mock_server,
        "adrien-boolean",
        serde_json::json!([{ "version": "1.0.0", "deleted_at": null }]),
    )
    .await;

    let (provider, builds) = CountingProvider::new();
    let client = Arc::new(ForgeClient::with_provider(&mock_server.uri(), provider).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.latest_version("adrien/boolean").await })
        })
        .collect();

    for handle in handles {
        let latest = handle.await.unwrap().unwrap();
        assert_eq!(latest.as_deref(), Some("1.0.0"));
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_preset_connection_skips_provider() {
    let mock_server = MockServer::start().await;
    mount_module(
        &mock_server,
        "adrien-boolean",
        serde_json::json!([{ "version": "3.0.0", "deleted_at": null }]),
    )
    .await;

    let conn = ConnectionBuilder::new().build(&mock_server.uri()).unwrap();
    let (provider, builds) = CountingProvider::new();
    let client = ForgeClient::with_provider(&mock_server.uri(), provider)
        .unwrap()
        .with_connection(conn);

    assert_eq!(
        client.latest_version("adrien/boolean").await.unwrap().as_deref(),
        Some("3.0.0")
    );
    assert_eq!(builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connection_build_failure_propagates() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("broken.pem"), "garbage").unwrap();

    let options = ConnectionOptions {
        cert_dir: temp_dir.path().to_path_buf(),
        ..ConnectionOptions::default()
    };
    let client = ForgeClient::with_options("forgeapi.puppetlabs.com", options).unwrap();

    let err = client.versions("adrien/boolean").await.unwrap_err();
    assert!(matches!(err, ForgeError::Connection { .. }));
}
