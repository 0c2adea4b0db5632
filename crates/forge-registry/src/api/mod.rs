//! Forge v3 API response types

use forge_core::Release;
use serde::{Deserialize, Serialize};

/// Module metadata response from `GET /v3/modules/<slug>`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleResponse {
    /// Module slug ("author-module")
    #[serde(default)]
    pub slug: Option<String>,
    /// Short module name
    #[serde(default)]
    pub name: Option<String>,
    /// Set when the whole module has been deprecated
    #[serde(default)]
    pub deprecated_at: Option<String>,
    /// All releases, newest first, including soft-deleted ones
    pub releases: Vec<Release>,
}

impl ModuleResponse {
    /// Releases that have not been soft-deleted, in registry order
    pub fn live_releases(self) -> Vec<Release> {
        self.releases
            .into_iter()
            .filter(|release| !release.is_deleted())
            .collect()
    }
}
