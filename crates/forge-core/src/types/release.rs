//! Release records and the version lists derived from them.

use serde::{Deserialize, Serialize};

/// One published version of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Version string, e.g. "1.0.1"
    pub version: String,
    /// Set when the release has been soft-deleted
    #[serde(default)]
    pub deleted_at: Option<String>,
    /// Registry slug of the release ("author-module-1.0.1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Publication timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Release {
    /// Create a live release with only a version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            deleted_at: None,
            slug: None,
            created_at: None,
        }
    }

    /// Mark this release as soft-deleted at the given timestamp
    pub fn deleted(mut self, at: impl Into<String>) -> Self {
        self.deleted_at = Some(at.into());
        self
    }

    /// Check if the release has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Versions of a module, oldest first and newest last
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionList {
    versions: Vec<String>,
}

impl VersionList {
    /// Build from releases in registry order (newest first).
    ///
    /// Soft-deleted releases are dropped and the remainder reversed. When
    /// every version is valid semver the list is additionally sorted by
    /// semver precedence (stable), otherwise the reversed order is kept.
    pub fn from_registry_order<I>(releases: I) -> Self
    where
        I: IntoIterator<Item = Release>,
    {
        let mut versions: Vec<String> = releases
            .into_iter()
            .filter(|release| !release.is_deleted())
            .map(|release| release.version)
            .collect();
        versions.reverse();

        let parsed: Option<Vec<semver::Version>> = versions
            .iter()
            .map(|v| semver::Version::parse(v).ok())
            .collect();

        if let Some(parsed) = parsed {
            let mut keyed: Vec<(semver::Version, String)> =
                parsed.into_iter().zip(versions).collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            versions = keyed.into_iter().map(|(_, v)| v).collect();
        }

        Self { versions }
    }

    /// The newest version, if any
    pub fn latest(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(String::as_str)
    }

    /// Consume the list, yielding the ordered version strings
    pub fn into_vec(self) -> Vec<String> {
        self.versions
    }
}

impl From<VersionList> for Vec<String> {
    fn from(list: VersionList) -> Self {
        list.versions
    }
}
