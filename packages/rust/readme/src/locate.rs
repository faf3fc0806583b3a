//! Region lookup by literal marker lines.
//!
//! Markers are HTML comments on a line of their own:
//!
//! ```text
//! <!-- Domain A Start -->
//! ...
//! <!-- Domain A End -->
//! ```
//!
//! A line matches only if it is character-for-character equal to the marker,
//! terminator included. Section and entry lookups are independent: an entry is
//! found wherever its markers appear, even outside the section it is filed under.

use quantifying_shared::{QuantifyingError, Result};

use crate::document::Document;

/// Start/end marker lines for a named region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub start: String,
    pub end: String,
}

impl Markers {
    pub fn new(name: &str) -> Self {
        Self {
            start: format!("<!-- {name} Start -->\n"),
            end: format!("<!-- {name} End -->\n"),
        }
    }
}

/// Line span of an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryBounds {
    /// Index of the entry's start marker.
    pub start: usize,
    /// Index of the last line to replace: the end marker plus any blank lines after it.
    pub end: usize,
}

/// Index of the first line equal to `marker`.
pub fn find_marker(lines: &[String], marker: &str) -> Option<usize> {
    lines.iter().position(|line| line == marker)
}

/// Index of the section's end marker, or `None` if its start marker is absent.
///
/// A start marker with no end marker after it is an integrity error.
pub fn section_end(doc: &Document, section_title: &str) -> Result<Option<usize>> {
    let markers = Markers::new(section_title);
    let lines = doc.lines();

    let Some(start) = find_marker(lines, &markers.start) else {
        return Ok(None);
    };

    let end = paired_end(doc, &markers, start, "section", section_title)?;
    Ok(Some(end))
}

/// Bounds of the entry, or `None` if its start marker is absent.
///
/// Blank or whitespace-only lines directly after the end marker are absorbed
/// into the span so that replacement does not accumulate padding.
pub fn entry_bounds(doc: &Document, entry_title: &str) -> Result<Option<EntryBounds>> {
    let markers = Markers::new(entry_title);
    let lines = doc.lines();

    let Some(start) = find_marker(lines, &markers.start) else {
        return Ok(None);
    };

    let mut end = paired_end(doc, &markers, start, "entry", entry_title)?;
    while lines.get(end + 1).is_some_and(|line| line.trim().is_empty()) {
        end += 1;
    }

    Ok(Some(EntryBounds { start, end }))
}

/// Locate the first end marker after the start marker at `start`.
///
/// An end marker found only before `start` is reported as misordered.
fn paired_end(
    doc: &Document,
    markers: &Markers,
    start: usize,
    kind: &str,
    name: &str,
) -> Result<usize> {
    let lines = doc.lines();
    if let Some(offset) = find_marker(&lines[start + 1..], &markers.end) {
        return Ok(start + 1 + offset);
    }

    match find_marker(&lines[..start], &markers.end) {
        Some(end) => Err(QuantifyingError::integrity(
            doc.path(),
            format!(
                "{kind} '{name}' end marker (line {}) precedes its start marker (line {})",
                end + 1,
                start + 1
            ),
        )),
        None => Err(QuantifyingError::integrity(
            doc.path(),
            format!(
                "{kind} '{name}' has a start marker (line {}) but no end marker",
                start + 1
            ),
        )),
    }
}
