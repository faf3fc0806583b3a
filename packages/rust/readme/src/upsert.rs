//! Entry block construction and splicing.
//!
//! An entry is always rendered fresh from its inputs, then either inserted
//! just before its section's end marker or swapped in for the old span.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use quantifying_shared::{QuantifyingError, Result};

use crate::document::{Document, split_lines};
use crate::locate::{self, EntryBounds, Markers};

/// A generated entry to upsert into a report section.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    /// Section the entry belongs to (`## {section_title}`).
    pub section_title: String,
    /// Entry name, used for its markers and `### {entry_title}` heading.
    pub entry_title: String,
    /// Image to reference. Requires `image_caption`.
    pub image_path: Option<PathBuf>,
    /// Caption for the image. Requires `image_path`.
    pub image_caption: Option<String>,
    /// Free-form descriptive text.
    pub entry_text: Option<String>,
}

impl EntryUpdate {
    pub fn new(section_title: impl Into<String>, entry_title: impl Into<String>) -> Self {
        Self {
            section_title: section_title.into(),
            entry_title: entry_title.into(),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>, caption: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self.image_caption = Some(caption.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.entry_text = Some(text.into());
        self
    }

    /// Image path, treating an empty path as absent.
    pub fn image(&self) -> Option<&Path> {
        self.image_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Image caption, treating an empty caption as absent.
    pub fn caption(&self) -> Option<&str> {
        self.image_caption.as_deref().filter(|c| !c.is_empty())
    }

    /// Entry text, treating empty text as absent.
    pub fn text(&self) -> Option<&str> {
        self.entry_text.as_deref().filter(|t| !t.is_empty())
    }

    /// Reject an image without a caption and a caption without an image.
    ///
    /// Empty strings count as missing.
    pub fn validate(&self) -> Result<()> {
        match (self.image(), self.caption()) {
            (Some(_), None) => Err(QuantifyingError::invalid_input(
                "an image caption is required when an image path is provided",
            )),
            (None, Some(_)) => Err(QuantifyingError::invalid_input(
                "an image path is required when an image caption is provided",
            )),
            _ => Ok(()),
        }
    }
}

/// Lines appended when a section does not exist yet.
pub fn section_scaffold(section_title: &str) -> Vec<String> {
    let markers = Markers::new(section_title);
    vec![
        markers.start,
        "\n".into(),
        "\n".into(),
        format!("## {section_title}\n"),
        "\n".into(),
        "\n".into(),
        markers.end,
        "\n".into(),
    ]
}

/// Render an entry's full block, markers and trailing padding included.
///
/// `image` is `(caption, relative_path)`. Empty caption or text is skipped.
pub fn entry_block(
    entry_title: &str,
    image: Option<(&str, &str)>,
    caption: Option<&str>,
    text: Option<&str>,
) -> Vec<String> {
    let caption = caption.filter(|c| !c.is_empty());
    let text = text.filter(|t| !t.is_empty());
    let markers = Markers::new(entry_title);
    let mut block = vec![markers.start, "\n".into(), format!("### {entry_title}\n")];

    if let Some((caption, path)) = image {
        block.push("\n".into());
        block.push(format!("![{caption}]({path})\n"));
    }

    let body = match (caption, text) {
        (Some(caption), Some(text)) => Some(format!("{caption}\n\n{text}\n")),
        (None, Some(text)) => Some(format!("{text}\n")),
        (Some(caption), None) => Some(format!("{caption}\n")),
        (None, None) => None,
    };
    if let Some(body) = body {
        block.push("\n".into());
        block.extend(split_lines(&body));
    }

    block.extend([
        "\n".into(),
        markers.end,
        "\n".into(),
        "\n".into(),
    ]);
    block
}

/// Apply `update` to `doc`, returning the rebuilt document.
///
/// The title must already be normalized. Nothing here touches the filesystem
/// except resolving a relative image path against the working directory.
pub fn apply(mut doc: Document, update: &EntryUpdate) -> Result<Document> {
    update.validate()?;

    let section_end = match locate::section_end(&doc, &update.section_title)? {
        Some(end) => end,
        None => {
            debug!(section = %update.section_title, "creating section scaffold");
            doc.extend(section_scaffold(&update.section_title));
            doc.lines().len() - 2
        }
    };

    let bounds = locate::entry_bounds(&doc, &update.entry_title)?;

    let relative_image = match update.image() {
        Some(path) => Some(relative_path(path, doc.dir())?),
        None => None,
    };
    let image = match (update.caption(), &relative_image) {
        (Some(caption), Some(path)) => Some((caption, path.as_str())),
        _ => None,
    };

    let block = entry_block(&update.entry_title, image, update.caption(), update.text());

    let (path, lines) = doc.into_lines();
    let lines = match bounds {
        None => {
            debug!(entry = %update.entry_title, at = section_end, "appending entry to section");
            splice(lines, section_end, section_end, block)
        }
        Some(EntryBounds { start, end }) => {
            debug!(entry = %update.entry_title, start, end, "replacing entry in place");
            splice(lines, start, end + 1, block)
        }
    };

    Ok(Document::from_lines(path, lines))
}

/// Rebuild `lines` as `lines[..from] + block + lines[to..]`.
fn splice(lines: Vec<String>, from: usize, to: usize, block: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() - (to - from) + block.len());
    let mut rest = lines.into_iter();
    out.extend(rest.by_ref().take(from));
    out.extend(block);
    out.extend(rest.skip(to - from));
    out
}

/// Express `target` relative to the directory `base`, using `/` separators.
///
/// Both paths are made absolute against the working directory first.
pub fn relative_path(target: &Path, base: &Path) -> Result<String> {
    let base = if base.as_os_str().is_empty() {
        Path::new(".")
    } else {
        base
    };
    let target = std::path::absolute(target).map_err(|e| QuantifyingError::io(target, e))?;
    let base = std::path::absolute(base).map_err(|e| QuantifyingError::io(base, e))?;

    let target = normalize(&target);
    let base = normalize(&base);

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat_n("..".to_string(), base.len() - common));
    parts.extend(target[common..].iter().cloned());

    if parts.is_empty() {
        return Ok(".".to_string());
    }
    Ok(parts.join("/"))
}

/// Lexically resolve `.` and `..`, keeping prefix/root as leading components.
fn normalize(path: &Path) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.len() > 1 {
                    out.pop();
                }
            }
            Component::Prefix(p) => out.push(p.as_os_str().to_string_lossy().into_owned()),
            Component::RootDir => out.push("/".to_string()),
            Component::Normal(part) => out.push(part.to_string_lossy().into_owned()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(lines: &[String]) -> String {
        lines.concat()
    }

    #[test]
    fn validation_rejects_unpaired_image_and_caption() {
        let mut update = EntryUpdate::new("S", "E");
        update.image_path = Some(PathBuf::from("/tmp/a.png"));
        assert!(matches!(
            update.validate().unwrap_err(),
            QuantifyingError::InvalidInput { .. }
        ));

        let mut update = EntryUpdate::new("S", "E");
        update.image_caption = Some("Figure".into());
        let err = update.validate().unwrap_err();
        assert!(err.to_string().contains("image path is required"));

        let err = EntryUpdate::new("S", "E")
            .with_image("/repo/a.png", "")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("image caption is required"));

        let mut update = EntryUpdate::new("S", "E");
        update.image_path = Some(PathBuf::new());
        update.image_caption = Some("Figure".into());
        assert!(update.validate().is_err());

        assert!(EntryUpdate::new("S", "E").validate().is_ok());
        assert!(
            EntryUpdate::new("S", "E")
                .with_image("/tmp/a.png", "Figure")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn scaffold_shape() {
        assert_eq!(
            render(&section_scaffold("Domain A")),
            "<!-- Domain A Start -->\n\n\n## Domain A\n\n\n<!-- Domain A End -->\n\n"
        );
    }

    #[test]
    fn block_with_image_caption_and_text() {
        let block = entry_block(
            "Plot 1",
            Some(("Figure 1", "img/plot1.png")),
            Some("Figure 1"),
            Some("Some analysis."),
        );
        assert_eq!(
            render(&block),
            "<!-- Plot 1 Start -->\n\n### Plot 1\n\n![Figure 1](img/plot1.png)\n\
             \nFigure 1\n\nSome analysis.\n\n<!-- Plot 1 End -->\n\n\n"
        );
    }

    #[test]
    fn block_text_only() {
        let block = entry_block("Notes", None, None, Some("Just text."));
        assert_eq!(
            render(&block),
            "<!-- Notes Start -->\n\n### Notes\n\nJust text.\n\n<!-- Notes End -->\n\n\n"
        );
    }

    #[test]
    fn block_caption_without_text() {
        let block = entry_block("P", Some(("Cap", "p.png")), Some("Cap"), None);
        assert_eq!(
            render(&block),
            "<!-- P Start -->\n\n### P\n\n![Cap](p.png)\n\nCap\n\n<!-- P End -->\n\n\n"
        );
    }

    #[test]
    fn block_heading_only() {
        let block = entry_block("Empty", None, None, None);
        assert_eq!(
            render(&block),
            "<!-- Empty Start -->\n\n### Empty\n\n<!-- Empty End -->\n\n\n"
        );
    }

    #[test]
    fn empty_text_adds_no_body() {
        let block = entry_block("E", None, None, Some(""));
        assert_eq!(
            render(&block),
            "<!-- E Start -->\n\n### E\n\n<!-- E End -->\n\n\n"
        );

        let doc = Document::from_text("/repo/README.md", "");
        let update = EntryUpdate::new("S", "E").with_text("");
        let rendered = apply(doc, &update).unwrap().render();
        assert!(rendered.contains("### E\n\n<!-- E End -->\n"));
    }

    #[test]
    fn multiline_text_split_into_lines() {
        let block = entry_block("E", None, None, Some("one\n\ntwo"));
        assert!(block.iter().all(|line| line.ends_with('\n')));
        assert!(block.iter().all(|line| line.matches('\n').count() == 1));
        assert!(render(&block).contains("\none\n\ntwo\n"));
    }

    #[test]
    fn splice_insert_and_replace() {
        let lines: Vec<String> = ["a\n", "b\n", "c\n"].map(String::from).to_vec();
        let block = vec!["X\n".to_string()];

        assert_eq!(render(&splice(lines.clone(), 1, 1, block.clone())), "a\nX\nb\nc\n");
        assert_eq!(render(&splice(lines, 1, 3, block)), "a\nX\n");
    }

    #[test]
    fn relative_path_cases() {
        let quarter_dir = Path::new("/repo/data/2024Q1");

        let rel = relative_path(Path::new("/repo/data/2024Q1/img/plot.png"), quarter_dir);
        assert_eq!(rel.unwrap(), "img/plot.png");

        let rel = relative_path(Path::new("/repo/data/shared/plot.png"), quarter_dir);
        assert_eq!(rel.unwrap(), "../shared/plot.png");

        let rel = relative_path(Path::new("/repo/a/./b/../c.png"), Path::new("/repo"));
        assert_eq!(rel.unwrap(), "a/c.png");

        let rel = relative_path(Path::new("/repo"), Path::new("/repo"));
        assert_eq!(rel.unwrap(), ".");
    }

    #[test]
    fn apply_creates_section_then_appends() {
        let doc = Document::from_text("/repo/data/2024Q1/README.md", "# T\n\n");
        let update = EntryUpdate::new("S", "E").with_text("hello");
        let doc = apply(doc, &update).unwrap();
        assert_eq!(
            doc.render(),
            "# T\n\n<!-- S Start -->\n\n\n## S\n\n\n\
             <!-- E Start -->\n\n### E\n\nhello\n\n<!-- E End -->\n\n\n\
             <!-- S End -->\n\n"
        );
    }

    #[test]
    fn apply_rejects_before_touching_document() {
        let doc = Document::from_text("/repo/README.md", "keep\n");
        let mut update = EntryUpdate::new("S", "E");
        update.image_caption = Some("orphan caption".into());
        assert!(apply(doc, &update).is_err());
    }
}
