//! # forge-cli
//!
//! Command line client for the Puppet Forge module registry.
//!
//! This is the main entry point for the `forge` tool. It handles command parsing,
//! sets up logging and error handling, and dispatches to the appropriate command handlers.

use std::collections::HashMap;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use forge_core::error::{ForgeError, ForgeResult};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;
use output::OutputHandler;

/// Query module versions on a Puppet Forge
#[derive(Parser)]
#[command(name = "forge", version, about = "Puppet Forge module registry client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Forge host or base URL
    #[arg(long, global = true, value_name = "HOST")]
    pub forge: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory of extra trusted *.pem certificates
    #[arg(long, global = true, value_name = "DIR")]
    pub cert_dir: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all published versions of a module, oldest first
    Versions {
        /// Module name, e.g. puppetlabs/stdlib
        module: String,
        /// Print the list as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print the newest published version of a module
    Latest {
        /// Module name, e.g. puppetlabs/stdlib
        module: String,
    },
    /// Show the effective configuration
    Config {
        /// Print the settings as a forge.toml document
        #[arg(long)]
        toml: bool,
    },
    /// Show version information
    Version,
}

impl Cli {
    /// Command line settings in the shape the config layering expects
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(forge) = &self.forge {
            overrides.insert("baseurl".to_string(), forge.clone());
        }
        if let Some(timeout) = self.timeout {
            overrides.insert("timeout".to_string(), timeout.to_string());
        }
        if let Some(cert_dir) = &self.cert_dir {
            overrides.insert("cert-dir".to_string(), cert_dir.clone());
        }
        overrides
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting forge v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            OutputHandler::new().error(ErrorFormatter::new().format_error(&err).trim_end());
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> ForgeResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| ForgeError::io("Failed to create async runtime", e))?;

    let overrides = cli.overrides();
    rt.block_on(async {
        let ctx = CommandContext::new(overrides).await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "forge={level},forge_registry={level},forge_config={level},forge_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("forge encountered an unexpected error: {}", panic_info);
        eprintln!("forge crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
