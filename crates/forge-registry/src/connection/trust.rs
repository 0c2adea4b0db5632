//! Certificate trust store composition for HTTPS connections.
//!
//! The operating system's default roots are always trusted; every `*.pem`
//! file found in the configured certificate directory is added on top.

use std::fmt;
use std::path::{Path, PathBuf};

use forge_core::ForgeError;
use reqwest::{Certificate, ClientBuilder};
use tracing::debug;

use crate::RegistryResult;

/// File pattern for bundled certificates
pub const CERT_PATTERN: &str = "*.pem";

/// Extra trusted roots layered over the system defaults
#[derive(Clone, Default)]
pub struct TrustStore {
    certificates: Vec<Certificate>,
    sources: Vec<PathBuf>,
}

impl TrustStore {
    /// Load every certificate matching [`CERT_PATTERN`] in `dir`.
    ///
    /// A missing directory or an empty one yields an empty store.
    pub fn load(dir: &Path) -> RegistryResult<Self> {
        let mut store = Self::default();

        if !dir.is_dir() {
            debug!("No certificate directory at {}", dir.display());
            return Ok(store);
        }

        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            CERT_PATTERN
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| ForgeError::connection(format!("Invalid certificate pattern {}", pattern), e))?;

        let mut paths = entries
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ForgeError::connection(format!("Failed to scan {}", dir.display()), e))?;
        paths.sort();

        for path in paths {
            store.add_file(&path)?;
        }

        debug!("Loaded {} trusted certificate(s) from {}", store.len(), dir.display());
        Ok(store)
    }

    /// Add every certificate in a PEM file; bundles may hold several roots
    pub fn add_file(&mut self, path: &Path) -> RegistryResult<()> {
        let pem = std::fs::read(path).map_err(|e| {
            ForgeError::connection(format!("Failed to read certificate {}", path.display()), e)
        })?;

        let certificates = Certificate::from_pem_bundle(&pem).map_err(|e| {
            ForgeError::connection(format!("Malformed certificate {}", path.display()), e)
        })?;

        if certificates.is_empty() {
            return Err(ForgeError::connection_msg(format!(
                "{} does not contain a PEM encoded certificate",
                path.display()
            )));
        }

        debug!("{} holds {} certificate(s)", path.display(), certificates.len());
        self.certificates.extend(certificates);
        self.sources.push(path.to_path_buf());
        Ok(())
    }

    /// Number of extra certificates
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Files the extra certificates were read from
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Register the extra roots with a client builder
    pub fn apply(self, builder: ClientBuilder) -> ClientBuilder {
        self.certificates
            .into_iter()
            .fold(builder, |builder, cert| builder.add_root_certificate(cert))
    }
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("sources", &self.sources)
            .finish()
    }
}
