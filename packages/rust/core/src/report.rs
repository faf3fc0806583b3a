//! Quarterly report updates, gated on the run's save switch.

use std::path::PathBuf;

use tracing::{debug, info, instrument};

use quantifying_readme::{EntryUpdate, upsert_entry};
use quantifying_shared::Result;

use crate::context::RunContext;

/// Upsert `update` into the current quarter's `README.md`.
///
/// Returns the report path when it was written, `None` when saving is off.
/// Nothing is validated or touched while saving is disabled.
#[instrument(skip_all, fields(quarter = %ctx.quarter, section = %update.section_title))]
pub fn update_readme(ctx: &RunContext, update: &EntryUpdate) -> Result<Option<PathBuf>> {
    if !ctx.config.enable_save {
        debug!(entry = %update.entry_title, "saving disabled, report left untouched");
        return Ok(None);
    }

    let readme_path = ctx.paths.readme_path(ctx.quarter);
    upsert_entry(&readme_path, &ctx.quarter.to_string(), update)?;

    info!("README path: {}", ctx.paths.display_relative(&readme_path));
    info!(
        "Updated README with new image and description for {}.",
        update.entry_title
    );

    Ok(Some(readme_path))
}
