//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking the shared `CommandContext`,
//! which carries the effective settings and builds the Forge client.

use std::collections::HashMap;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use forge_config::{ConfigLayering, ConfigLoader, ForgeSettings};
use forge_core::error::{ForgeError, ForgeResult};
use forge_registry::{ConnectionOptions, ForgeClient, USER_AGENT};
use tracing::{debug, info};

pub mod config;
pub mod latest;
pub mod versions;


use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: PathBuf,
    pub output: OutputHandler,
    pub settings: ForgeSettings,
}

impl CommandContext {
    /// Create a context, loading settings from config files, environment
    /// and command line overrides
    pub async fn new(cli_overrides: HashMap<String, String>) -> ForgeResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| ForgeError::io("Failed to get current directory", e))?;

        let utf8_cwd = Utf8PathBuf::try_from(cwd.clone()).map_err(|e| {
            ForgeError::ConfigValidation {
                field: "cwd".to_string(),
                reason: format!("Working directory is not valid UTF-8: {}", e),
            }
        })?;

        let env_overrides = ConfigLayering::collect_env_overrides();
        let settings = ConfigLoader::new(utf8_cwd)
            .load(&env_overrides, &cli_overrides)
            .await?;
        debug!("Effective settings: {:?}", settings);

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            settings,
        })
    }

    /// Connection options derived from the settings
    pub fn connection_options(&self) -> ConnectionOptions {
        let mut options = ConnectionOptions {
            authorization: self.settings.authorization.clone(),
            timeout: Some(self.settings.timeout),
            ..ConnectionOptions::default()
        };
        if let Some(cert_dir) = &self.settings.cert_dir {
            options.cert_dir = cert_dir.clone().into_std_path_buf();
        }
        options
    }

    /// Forge client for the configured endpoint
    pub fn client(&self) -> ForgeResult<ForgeClient> {
        ForgeClient::with_options(&self.settings.baseurl, self.connection_options())
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> ForgeResult<()> {
    match command {
        Commands::Versions { module, json } => {
            info!("Listing versions of {} (json: {})", module, json);
            versions::execute(&module, json, ctx).await
        }
        Commands::Latest { module } => {
            info!("Resolving latest version of {}", module);
            latest::execute(&module, ctx).await
        }
        Commands::Config { toml } => {
            info!("Showing effective configuration (toml: {})", toml);
            config::execute(toml, ctx).await
        }
        Commands::Version => {
            info!("Showing version information");
            show_version(ctx).await
        }
    }
}

async fn show_version(ctx: &CommandContext) -> ForgeResult<()> {
    ctx.output.field("forge", env!("CARGO_PKG_VERSION"));
    ctx.output.field("built", env!("BUILD_DATE"));
    ctx.output.field("target", env!("BUILD_TARGET"));
    ctx.output.field("rustc", env!("RUSTC_VERSION"));
    ctx.output.field("user agent", USER_AGENT.as_str());
    Ok(())
}
