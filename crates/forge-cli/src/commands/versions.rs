//! `forge versions` command implementation.
//!
//! Lists every published version of a module, oldest first.

use forge_core::error::{ForgeError, ForgeResult};
use super::CommandContext;

/// Fetch the ordered version list
pub async fn run(module: &str, ctx: &CommandContext) -> ForgeResult<Vec<String>> {
    ctx.client()?.versions(module).await
}

/// Render the version list as a single-line JSON array
pub fn render_json(versions: &[String]) -> ForgeResult<String> {
    serde_json::to_string(versions)
        .map_err(|e| ForgeError::io("Failed to render versions as JSON", e.into()))
}

/// Execute the `forge versions` command
pub async fn execute(module: &str, json: bool, ctx: &CommandContext) -> ForgeResult<()> {
    let versions = run(module, ctx).await?;

    if json {
        ctx.output.data(&render_json(&versions)?);
        return Ok(());
    }

    if versions.is_empty() {
        ctx.output.warn(&format!("{} has no published releases", module));
    }
    for version in &versions {
        ctx.output.data(version);
    }

    Ok(())
}
