//! Configuration layering, fallback logic, and environment overrides

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use camino::Utf8PathBuf;
use forge_core::error::ForgeError;

use crate::file::{load_from_file, validate_section, ForgeSection, ForgeToml};
use crate::ConfigResult;

/// Project configuration file name
pub const PROJECT_CONFIG: &str = "forge.toml";

/// Forge used when no layer names one
pub const DEFAULT_BASEURL: &str = "https://forgeapi.puppetlabs.com";

/// Request timeout used when no layer sets one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Prefix of recognised environment variables
pub const ENV_PREFIX: &str = "FORGE_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Home directory holding `.forge/config.toml`
    home: Option<Utf8PathBuf>,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project forge.toml file
    Project(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Global(path) => write!(f, "global config {}", path),
            ConfigSource::Project(path) => write!(f, "project config {}", path),
            ConfigSource::Environment(key) => write!(f, "environment variable {}", key),
            ConfigSource::CommandLine => f.write_str("command line"),
        }
    }
}

/// Effective settings after every layer has been applied
#[derive(Clone, PartialEq)]
pub struct ForgeSettings {
    /// Forge host or base URL
    pub baseurl: String,
    /// Authorization header value
    pub authorization: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Extra trusted certificates; `None` uses the bundled directory
    pub cert_dir: Option<Utf8PathBuf>,
    /// Layers that contributed, lowest priority first
    pub sources: Vec<ConfigSource>,
}

impl ForgeSettings {
    /// Resolve a merged section, filling defaults
    pub fn from_section(section: ForgeSection, sources: Vec<ConfigSource>) -> ConfigResult<Self> {
        validate_section(&section)?;

        Ok(Self {
            baseurl: section
                .baseurl
                .unwrap_or_else(|| DEFAULT_BASEURL.to_string()),
            authorization: section.authorization,
            timeout: Duration::from_secs(section.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            cert_dir: section.cert_dir.map(Utf8PathBuf::from),
            sources,
        })
    }

    /// Authorization value safe for display: scheme kept, secret hidden
    pub fn masked_authorization(&self) -> Option<String> {
        self.authorization.as_deref().map(|value| match value.split_once(' ') {
            Some((scheme, _)) => format!("{} ********", scheme),
            None => "********".to_string(),
        })
    }

    /// Settings as a `forge.toml` document, with the token masked
    pub fn to_forge_toml(&self) -> ForgeToml {
        ForgeToml {
            forge: ForgeSection {
                baseurl: Some(self.baseurl.clone()),
                authorization: self.masked_authorization(),
                timeout: Some(self.timeout.as_secs()),
                cert_dir: self.cert_dir.as_ref().map(|dir| dir.to_string()),
            },
        }
    }
}

impl Default for ForgeSettings {
    fn default() -> Self {
        Self {
            baseurl: DEFAULT_BASEURL.to_string(),
            authorization: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cert_dir: None,
            sources: Vec::new(),
        }
    }
}

impl fmt::Debug for ForgeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForgeSettings")
            .field("baseurl", &self.baseurl)
            .field("authorization", &self.masked_authorization())
            .field("timeout", &self.timeout)
            .field("cert_dir", &self.cert_dir)
            .field("sources", &self.sources)
            .finish()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        let home = dirs::home_dir().and_then(|home| Utf8PathBuf::try_from(home).ok());
        Self { cwd, home }
    }

    /// Use a different home directory for the global config
    pub fn with_home(mut self, home: Option<Utf8PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Find forge.toml in the working directory or its ancestors
    pub fn find_project_config(&self) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(PROJECT_CONFIG))
            .find(|candidate| candidate.is_file())
    }

    /// Location of the global configuration file
    pub fn global_config_path(&self) -> Option<Utf8PathBuf> {
        self.home
            .as_ref()
            .map(|home| home.join(".forge").join("config.toml"))
    }

    /// Load project configuration, if any
    pub async fn load_project_config(&self) -> ConfigResult<Option<(ForgeToml, ConfigSource)>> {
        match self.find_project_config() {
            Some(path) => {
                let config = load_from_file(&path).await?;
                Ok(Some((config, ConfigSource::Project(path))))
            },
            None => Ok(None),
        }
    }

    /// Load global configuration, if any
    pub async fn load_global_config(&self) -> ConfigResult<Option<(ForgeToml, ConfigSource)>> {
        match self.global_config_path() {
            Some(path) if path.is_file() => {
                let config = load_from_file(&path).await?;
                Ok(Some((config, ConfigSource::Global(path))))
            },
            _ => Ok(None),
        }
    }

    /// Load every layer and merge them into effective settings
    pub async fn load(
        &self,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &HashMap<String, String>,
    ) -> ConfigResult<ForgeSettings> {
        let global = self.load_global_config().await?;
        let project = self.load_project_config().await?;
        ConfigLayering::merge_configs(global, project, env_overrides, cli_overrides)
    }
}

impl ConfigLayering {
    /// Merge layers: global < project < environment < command line
    pub fn merge_configs(
        global_config: Option<(ForgeToml, ConfigSource)>,
        project_config: Option<(ForgeToml, ConfigSource)>,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &HashMap<String, String>,
    ) -> ConfigResult<ForgeSettings> {
        let mut merged = ForgeSection::default();
        let mut sources = Vec::new();

        for (config, source) in [global_config, project_config].into_iter().flatten() {
            if !config.forge.is_empty() {
                merged.overlay(config.forge);
                sources.push(source);
            }
        }

        Self::apply_env_overrides(&mut merged, env_overrides, &mut sources)?;
        Self::apply_cli_overrides(&mut merged, cli_overrides, &mut sources)?;

        ForgeSettings::from_section(merged, sources)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        section: &mut ForgeSection,
        overrides: &HashMap<String, String>,
        sources: &mut Vec<ConfigSource>,
    ) -> ConfigResult<()> {
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();

        for key in keys {
            let value = &overrides[key];
            let applied = match key.as_str() {
                "FORGE_BASEURL" => {
                    section.baseurl = Some(value.clone());
                    true
                },
                "FORGE_AUTHORIZATION" => {
                    section.authorization = Some(value.clone());
                    true
                },
                "FORGE_TIMEOUT" => {
                    section.timeout = Some(parse_timeout(key, value)?);
                    true
                },
                "FORGE_CERT_DIR" => {
                    section.cert_dir = Some(value.clone());
                    true
                },
                // Unknown environment variable, ignore
                _ => false,
            };

            if applied {
                sources.push(ConfigSource::Environment(key.clone()));
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(
        section: &mut ForgeSection,
        overrides: &HashMap<String, String>,
        sources: &mut Vec<ConfigSource>,
    ) -> ConfigResult<()> {
        let mut applied = false;

        for (key, value) in overrides {
            match key.as_str() {
                "baseurl" => section.baseurl = Some(value.clone()),
                "authorization" => section.authorization = Some(value.clone()),
                "timeout" => section.timeout = Some(parse_timeout("--timeout", value)?),
                "cert-dir" => section.cert_dir = Some(value.clone()),
                // Unknown CLI override, ignore
                _ => continue,
            }
            applied = true;
        }

        if applied {
            sources.push(ConfigSource::CommandLine);
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn parse_timeout(field: &str, value: &str) -> ConfigResult<u64> {
    value.trim().parse().map_err(|e| ForgeError::ConfigValidation {
        field: field.to_string(),
        reason: format!("Invalid timeout '{}': {}", value, e),
    })
}
