//! Marker-delimited report updater.
//!
//! Maintains a hand-edited Markdown report that an automated pipeline
//! regenerates piecemeal. Generated content lives in *entries* (an image
//! reference plus text) grouped under *sections*; both are delimited by
//! literal HTML-comment marker lines. Everything outside an entry's markers
//! is left byte-for-byte intact.
//!
//! ```text
//! # Quantifying the Commons 2024Q1
//!
//! <!-- Domain A Start -->
//!
//!
//! ## Domain A
//!
//!
//! <!-- Plot 1 Start -->
//!
//! ### Plot 1
//!
//! ![Figure 1](img/plot1.png)
//!
//! Figure 1
//!
//! Some analysis.
//!
//! <!-- Plot 1 End -->
//!
//!
//! <!-- Domain A End -->
//! ```
//!
//! Updates are a single read-modify-write with no locking: two concurrent
//! writers to the same file can lose one update.

pub mod document;
pub mod locate;
pub mod upsert;

use std::path::Path;

use tracing::{debug, instrument};

use quantifying_shared::Result;

pub use document::{Document, title_line};
pub use locate::{EntryBounds, Markers};
pub use upsert::{EntryUpdate, entry_block, relative_path, section_scaffold};

/// Transform document text in memory: normalize the title and upsert the entry.
///
/// `path` is only used to resolve the image's relative path and to label errors.
pub fn upsert_text(path: &Path, text: &str, period: &str, update: &EntryUpdate) -> Result<String> {
    update.validate()?;

    let mut doc = Document::from_text(path, text);
    doc.ensure_title(&title_line(period));
    Ok(upsert::apply(doc, update)?.render())
}

/// Load the report at `path`, upsert `update` into it, and overwrite the file.
///
/// Input validation happens before the file is read, so an invalid update
/// never touches the document.
#[instrument(skip_all, fields(path = %path.display(), entry = %update.entry_title))]
pub fn upsert_entry(path: &Path, period: &str, update: &EntryUpdate) -> Result<()> {
    update.validate()?;

    let mut doc = Document::load(path)?;
    doc.ensure_title(&title_line(period));

    let doc = upsert::apply(doc, update)?;
    doc.write()?;

    debug!(lines = doc.lines().len(), "report updated");
    Ok(())
}
