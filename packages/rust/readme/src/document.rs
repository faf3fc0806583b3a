//! Line-oriented document loading, title normalization, and write-back.

use std::path::{Path, PathBuf};

use tracing::debug;

use quantifying_shared::{QuantifyingError, Result};

/// Canonical first line of a report for the given period label.
pub fn title_line(period: &str) -> String {
    format!("# Quantifying the Commons {period}\n")
}

/// A report document held as an ordered sequence of lines.
///
/// Every line keeps its own `\n` terminator, so rendering is plain concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    lines: Vec<String>,
}

impl Document {
    /// Read the document at `path`, or start empty if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "document not found, starting empty");
                String::new()
            }
            Err(e) => return Err(QuantifyingError::io(path, e)),
        };

        Ok(Self::from_text(path, &text))
    }

    /// Build a document from in-memory text.
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            lines: split_lines(text),
        }
    }

    /// Build a document from already-split lines.
    pub(crate) fn from_lines(path: PathBuf, lines: Vec<String>) -> Self {
        Self { path, lines }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn into_lines(self) -> (PathBuf, Vec<String>) {
        (self.path, self.lines)
    }

    /// Directory the document lives in; image paths are made relative to it.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Make sure the first line is `title`, inserting it plus a blank line if not.
    ///
    /// Comparison ignores surrounding whitespace. A mismatched first line is kept
    /// below the inserted title rather than overwritten.
    pub fn ensure_title(&mut self, title: &str) {
        let present = self
            .lines
            .first()
            .is_some_and(|first| first.trim() == title.trim());

        if !present {
            debug!(title = title.trim(), "inserting document title");
            self.lines.insert(0, title.to_string());
            self.lines.insert(1, "\n".to_string());
        }
    }

    /// Append lines to the end of the document.
    pub(crate) fn extend<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.lines.extend(lines);
    }

    /// Concatenate all lines back into document text.
    pub fn render(&self) -> String {
        self.lines.concat()
    }

    /// Overwrite the file at [`Document::path`] with the rendered text.
    pub fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| QuantifyingError::io(parent, e))?;
        }

        std::fs::write(&self.path, self.render())
            .map_err(|e| QuantifyingError::io(&self.path, e))?;

        debug!(path = %self.path.display(), lines = self.lines.len(), "wrote document");
        Ok(())
    }
}

/// Split text into lines that keep their `\n` terminators.
///
/// `\r\n` and lone `\r` are read as `\n`. A final line without a terminator
/// gets one, so markers appended later always start on a fresh line.
pub fn split_lines(text: &str) -> Vec<String> {
    let text = if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    };

    text.split_inclusive('\n')
        .map(|line| {
            if line.ends_with('\n') {
                line.to_string()
            } else {
                format!("{line}\n")
            }
        })
        .collect()
}
