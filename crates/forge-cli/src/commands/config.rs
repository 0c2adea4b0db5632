//! `forge config` command implementation.
//!
//! Shows the effective settings and the layers they came from.

use forge_config::file::serialize_forge_toml;
use forge_core::error::ForgeResult;
use super::CommandContext;

/// Effective settings as `forge.toml` text, token masked
pub fn render_toml(ctx: &CommandContext) -> ForgeResult<String> {
    serialize_forge_toml(&ctx.settings.to_forge_toml())
}

/// Execute the `forge config` command
pub async fn execute(toml: bool, ctx: &CommandContext) -> ForgeResult<()> {
    let settings = &ctx.settings;

    if toml {
        ctx.output.data(render_toml(ctx)?.trim_end());
        return Ok(());
    }

    let options = ctx.connection_options();

    ctx.output.field("baseurl", &settings.baseurl);
    ctx.output.field(
        "authorization",
        settings.masked_authorization().as_deref().unwrap_or("(none)"),
    );
    ctx.output.field("timeout", &format!("{}s", settings.timeout.as_secs()));
    ctx.output.field("cert_dir", &options.cert_dir.display().to_string());

    ctx.output.info(&format!("resolved from {}", ctx.cwd.display()));
    if settings.sources.is_empty() {
        ctx.output.info("No configuration found; using defaults");
    }
    for source in &settings.sources {
        ctx.output.info(&format!("from {}", source));
    }

    Ok(())
}
