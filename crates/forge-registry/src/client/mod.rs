//! Forge registry client: module version queries over a lazily built connection

use std::fmt;

use forge_core::{ForgeError, ModuleName, Release, VersionList};
use once_cell::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use crate::api::ModuleResponse;
use crate::connection::{Connection, ConnectionBuilder, ConnectionOptions, ConnectionProvider};
use crate::RegistryResult;

/// Canonical Forge API host
pub const DEFAULT_FORGE: &str = "forgeapi.puppetlabs.com";

/// Retired host that does not serve the v3 API
pub const LEGACY_FORGE: &str = "forge.puppetlabs.com";

/// Scheme, host and optional port/path prefix of a Forge instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: Option<u16>,
    prefix: String,
}

impl Endpoint {
    /// Parse `host`, `host:port` or a full `http(s)://` URL.
    ///
    /// Bare hosts default to HTTPS.
    pub fn parse(input: &str) -> RegistryResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ForgeError::connection_msg("Forge host is empty"));
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&candidate)
            .map_err(|e| ForgeError::connection(format!("Malformed Forge URL '{}'", input), e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ForgeError::connection_msg(format!(
                "Unsupported URL scheme '{}' in {}",
                url.scheme(),
                input
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ForgeError::connection_msg(format!("Forge URL '{}' has no host", input)))?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_ascii_lowercase(),
            port: url.port(),
            prefix: url.path().trim_end_matches('/').to_string(),
        })
    }

    /// The canonical public Forge
    pub fn canonical() -> Self {
        Self {
            scheme: "https".to_string(),
            host: DEFAULT_FORGE.to_string(),
            port: None,
            prefix: String::new(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Check if this is the retired legacy host
    pub fn is_legacy(&self) -> bool {
        self.host == LEGACY_FORGE
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}{}", self.scheme, self.host, port, self.prefix),
            None => format!("{}://{}{}", self.scheme, self.host, self.prefix),
        }
    }

    /// Parse and swap the legacy host for the canonical one, warning once
    pub fn resolve(input: &str) -> RegistryResult<Self> {
        let endpoint = Self::parse(input)?;
        if endpoint.is_legacy() {
            let canonical = Self::canonical();
            warn!(
                "{} does not support the latest Forge API. Please update to \"{}\"",
                input.trim(),
                canonical
            );
            return Ok(canonical);
        }
        Ok(endpoint)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::canonical()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

/// Client for one Forge instance.
///
/// The connection is built on first use through the injected
/// [`ConnectionProvider`] and reused afterwards; concurrent first use builds
/// it exactly once.
pub struct ForgeClient<P = ConnectionBuilder> {
    endpoint: Endpoint,
    provider: P,
    conn: OnceCell<Connection>,
}

impl ForgeClient<ConnectionBuilder> {
    /// Client for the canonical Forge with default connection options
    pub fn new() -> Self {
        Self {
            endpoint: Endpoint::canonical(),
            provider: ConnectionBuilder::new(),
            conn: OnceCell::new(),
        }
    }

    /// Client for `host` with default connection options
    pub fn with_host(host: &str) -> RegistryResult<Self> {
        Self::with_options(host, ConnectionOptions::default())
    }

    /// Client for `host` with custom connection options
    pub fn with_options(host: &str, options: ConnectionOptions) -> RegistryResult<Self> {
        Self::with_provider(host, ConnectionBuilder::with_options(options))
    }
}

impl Default for ForgeClient<ConnectionBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ConnectionProvider> ForgeClient<P> {
    /// Client for `host` whose connection comes from `provider`
    pub fn with_provider(host: &str, provider: P) -> RegistryResult<Self> {
        Ok(Self {
            endpoint: Endpoint::resolve(host)?,
            provider,
            conn: OnceCell::new(),
        })
    }

    /// Use an already built connection instead of building one
    pub fn with_connection(mut self, conn: Connection) -> Self {
        self.conn = OnceCell::with_value(conn);
        self
    }

    /// The effective endpoint after legacy host rewriting
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The client's connection, built on first call
    pub fn connection(&self) -> RegistryResult<&Connection> {
        self.conn
            .get_or_try_init(|| self.provider.connect(&self.endpoint.base_url()))
    }

    /// Non-deleted releases of a module, newest first as the Forge lists them
    pub async fn releases(&self, module_name: &str) -> RegistryResult<Vec<Release>> {
        let name = ModuleName::parse(module_name)?;
        Ok(self.fetch_module(&name).await?.live_releases())
    }

    /// Query for all published versions of a module, oldest first.
    ///
    /// ```no_run
    /// # async fn demo() -> forge_registry::RegistryResult<()> {
    /// let forge = forge_registry::ForgeClient::new();
    /// let versions = forge.versions("adrien/boolean").await?;
    /// // ["0.9.0-rc1", "0.9.0", "1.0.0", "1.0.1"]
    /// # Ok(())
    /// # }
    /// ```
    pub async fn versions(&self, module_name: &str) -> RegistryResult<Vec<String>> {
        Ok(self.version_list(module_name).await?.into_vec())
    }

    /// Query for the newest published version of a module
    pub async fn latest_version(&self, module_name: &str) -> RegistryResult<Option<String>> {
        Ok(self
            .version_list(module_name)
            .await?
            .latest()
            .map(str::to_string))
    }

    async fn version_list(&self, module_name: &str) -> RegistryResult<VersionList> {
        let name = ModuleName::parse(module_name)?;
        let module = self.fetch_module(&name).await?;
        let list = VersionList::from_registry_order(module.releases);
        debug!("{} has {} published version(s)", name, list.len());
        Ok(list)
    }

    async fn fetch_module(&self, name: &ModuleName) -> RegistryResult<ModuleResponse> {
        let path = name.api_path();
        debug!("Querying {} for {}", self.endpoint, name);
        self.connection()?.get(&path).await?.json()
    }
}

impl<P> fmt::Debug for ForgeClient<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForgeClient")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.conn.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
