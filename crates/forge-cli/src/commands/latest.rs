//! `forge latest` command implementation.

use forge_core::error::ForgeResult;
use super::CommandContext;

/// Execute the `forge latest` command
pub async fn execute(module: &str, ctx: &CommandContext) -> ForgeResult<()> {
    match ctx.client()?.latest_version(module).await? {
        Some(version) => ctx.output.data(&version),
        None => ctx.output.warn(&format!("{} has no published releases", module)),
    }
    Ok(())
}
