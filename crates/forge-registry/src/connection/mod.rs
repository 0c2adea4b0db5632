//! HTTP connections to a Forge instance.
//!
//! A [`ConnectionBuilder`] turns a base URL into a ready [`Connection`]:
//! user agent and authorization headers are installed, HTTPS targets get the
//! composed [`TrustStore`], and every response runs through the same
//! two-stage pipeline (JSON decoding, then status checking). Building never
//! touches the network.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use forge_core::ForgeError;
use once_cell::sync::{Lazy, OnceCell};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::RegistryResult;

pub mod trust;

pub use trust::TrustStore;

/// User agent sent with every request: client, version and platform
pub static USER_AGENT: Lazy<String> = Lazy::new(|| {
    format!(
        "forge-registry/{} ({}-{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH,
        std::env::consts::OS
    )
});

/// Request timeout applied unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static DEFAULT_AUTHORIZATION: OnceCell<String> = OnceCell::new();

/// Install the process-wide default `Authorization` value.
///
/// May be called once, before clients are built; connections built
/// without an explicit token pick it up. Later calls fail.
pub fn set_default_authorization(token: impl Into<String>) -> RegistryResult<()> {
    DEFAULT_AUTHORIZATION
        .set(token.into())
        .map_err(|_| ForgeError::ConfigValidation {
            field: "authorization".to_string(),
            reason: "the default authorization token can only be set once".to_string(),
        })
}

/// The process-wide default `Authorization` value, if installed
pub fn default_authorization() -> Option<&'static str> {
    DEFAULT_AUTHORIZATION.get().map(String::as_str)
}

/// Name of the bundled certificate directory
pub const CERT_DIR_NAME: &str = "ssl_certs";

/// Directory of bundled certificates.
///
/// An `ssl_certs` directory next to the running executable wins, so an
/// installed binary can ship its roots alongside it. Otherwise the directory
/// in this crate's source tree is used.
pub fn bundled_cert_dir() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    locate_bundled_cert_dir(exe_dir.as_deref())
}

fn locate_bundled_cert_dir(exe_dir: Option<&Path>) -> PathBuf {
    if let Some(candidate) = exe_dir.map(|dir| dir.join(CERT_DIR_NAME)) {
        if candidate.is_dir() {
            return candidate;
        }
    }

    let source_tree = Path::new(env!("CARGO_MANIFEST_DIR")).join(CERT_DIR_NAME);
    if !source_tree.is_dir() {
        debug!(
            "No bundled certificate directory found; set cert_dir or FORGE_CERT_DIR to trust extra roots"
        );
    }
    source_tree
}

/// Settings applied to every connection a builder creates
#[derive(Clone)]
pub struct ConnectionOptions {
    /// Sent verbatim as the `Authorization` header
    pub authorization: Option<String>,
    /// Whole-request timeout, `None` for the transport default
    pub timeout: Option<Duration>,
    /// Extra trusted certificates (HTTPS only)
    pub cert_dir: PathBuf,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            authorization: None,
            timeout: Some(DEFAULT_TIMEOUT),
            cert_dir: bundled_cert_dir(),
        }
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("cert_dir", &self.cert_dir)
            .finish()
    }
}

/// Source of connections for a registry client
pub trait ConnectionProvider {
    /// Build a new connection bound to `base_url`
    fn connect(&self, base_url: &str) -> RegistryResult<Connection>;
}

/// Builds configured connections
#[derive(Debug, Clone, Default)]
pub struct ConnectionBuilder {
    options: ConnectionOptions,
}

impl ConnectionBuilder {
    /// Builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with custom options
    pub fn with_options(options: ConnectionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Build a connection for `base_url`
    pub fn build(&self, base_url: &str) -> RegistryResult<Connection> {
        let url = Url::parse(base_url)
            .map_err(|e| ForgeError::connection(format!("Malformed base URL '{}'", base_url), e))?;

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT.as_str())
            .default_headers(self.default_headers()?)
            .gzip(true);

        if let Some(timeout) = self.options.timeout {
            builder = builder.timeout(timeout);
        }

        match url.scheme() {
            "https" => {
                let store = TrustStore::load(&self.options.cert_dir)?;
                builder = store.apply(builder);
            },
            "http" => {},
            other => {
                return Err(ForgeError::connection_msg(format!(
                    "Unsupported URL scheme '{}' in {}",
                    other, base_url
                )));
            },
        }

        let http = builder
            .build()
            .map_err(|e| ForgeError::connection(format!("Failed to create HTTP client for {}", url), e))?;

        debug!("Built connection to {}", url);
        Ok(Connection { http, base_url: url })
    }

    fn default_headers(&self) -> RegistryResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let token = match self.options.authorization.as_deref() {
            Some(token) => Some(token),
            None => default_authorization(),
        };

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(token)
                .map_err(|e| ForgeError::connection("Invalid authorization token", e))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}

impl ConnectionProvider for ConnectionBuilder {
    fn connect(&self, base_url: &str) -> RegistryResult<Connection> {
        self.build(base_url)
    }
}

/// A configured HTTP client bound to one base URL
#[derive(Debug, Clone)]
pub struct Connection {
    http: Client,
    base_url: Url,
}

/// A successful (2xx) response after the decoding stage
#[derive(Debug, Clone)]
pub struct Response {
    pub path: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Decoded body; `None` unless the content type was JSON
    pub body: Option<serde_json::Value>,
}

impl Connection {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a request path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// GET `path`, decode a JSON body and reject non-2xx statuses
    pub async fn get(&self, path: &str) -> RegistryResult<Response> {
        let url = self.url_for(path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ForgeError::connection(format!("Failed to read response from {}", url), e))?;

        // An undecodable error body must not hide the status.
        let body = match decode_json(content_type.as_deref(), &bytes) {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(ForgeError::decode(path, "response body is not valid JSON", e));
            },
            Err(_) => None,
        };

        if !status.is_success() {
            return Err(ForgeError::Registry {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(Response {
            path: path.to_string(),
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

impl Response {
    /// Deserialize the decoded body into `T`
    pub fn json<T: DeserializeOwned>(self) -> RegistryResult<T> {
        let body = self.body.ok_or_else(|| ForgeError::Decode {
            path: self.path.clone(),
            message: format!(
                "expected a JSON response, got content type '{}'",
                self.content_type.as_deref().unwrap_or("none")
            ),
            source: None,
        })?;

        serde_json::from_value(body)
            .map_err(|e| ForgeError::decode(self.path, "unexpected response shape", e))
    }
}

/// Check whether a content type names JSON (`\bjson$`, parameters ignored)
pub fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.strip_suffix("json") {
        Some(prefix) => prefix
            .chars()
            .last()
            .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_')),
        None => false,
    }
}

fn decode_json(
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<Option<serde_json::Value>, serde_json::Error> {
    match content_type {
        Some(ct) if is_json_content_type(ct) && !bytes.is_empty() => {
            serde_json::from_slice(bytes).map(Some)
        },
        _ => Ok(None),
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> ForgeError {
    let message = if error.is_timeout() {
        format!("Request timed out: {}", url)
    } else if error.is_connect() {
        format!("Connection failed: {}", url)
    } else {
        format!("HTTP request failed: {}", url)
    };
    ForgeError::connection(message, error)
}
