//! Repository path table.
//!
//! Every path is absolute. Quarter-scoped paths live under `data/<quarter>/`,
//! with one directory per pipeline phase.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use quantifying_shared::{QuantifyingError, Quarter, Result};

/// Pipeline phases, in execution order.
pub const PHASES: [&str; 3] = ["1-fetch", "2-process", "3-report"];

/// Labels whose paths embed the quarter and move with it.
const QUARTER_LABELS: [&str; 5] = [
    "data_1-fetch",
    "data_2-process",
    "data_3-report",
    "data_phase",
    "data_quarter",
];

/// Name of the generated report inside each quarter directory.
pub const README_FILE_NAME: &str = "README.md";

/// A labelled path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry {
    pub label: String,
    pub path: PathBuf,
}

/// Ordered table of labelled repository paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathTable {
    entries: Vec<PathEntry>,
}

impl PathTable {
    /// Build the table for `repo`, the current `phase`, and `quarter`.
    ///
    /// `repo` is resolved to an absolute, symlink-free path and must exist.
    #[instrument(skip_all, fields(repo = %repo.display(), phase = %phase, quarter = %quarter))]
    pub fn setup(repo: &Path, phase: &str, quarter: Quarter) -> Result<Self> {
        if !PHASES.contains(&phase) {
            return Err(QuantifyingError::invalid_input(format!(
                "unknown phase '{phase}': expected one of {}",
                PHASES.join(", ")
            )));
        }

        let repo = std::fs::canonicalize(repo).map_err(|e| QuantifyingError::io(repo, e))?;
        let data = repo.join("data");
        let data_quarter = data.join(quarter.to_string());

        let mut table = Self {
            entries: Vec::new(),
        };
        table.push("repo", resolve(&repo));
        table.push("dotenv", resolve(&repo.join(".env")));
        table.push("data", resolve(&data));
        for p in PHASES {
            table.push(&format!("data_{p}"), resolve(&data_quarter.join(p)));
        }
        table.push("data_phase", resolve(&data_quarter.join(phase)));
        table.push("data_quarter", resolve(&data_quarter));

        Ok(table)
    }

    fn push(&mut self, label: &str, path: PathBuf) {
        self.entries.push(PathEntry {
            label: label.to_string(),
            path,
        });
    }

    pub fn get(&self, label: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.path.as_path())
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    fn required(&self, label: &str) -> &Path {
        // Every constructor inserts the fixed label set.
        self.get(label).unwrap_or_else(|| Path::new(""))
    }

    pub fn repo(&self) -> &Path {
        self.required("repo")
    }

    pub fn data(&self) -> &Path {
        self.required("data")
    }

    pub fn data_quarter(&self) -> &Path {
        self.required("data_quarter")
    }

    pub fn data_phase(&self) -> &Path {
        self.required("data_phase")
    }

    /// Report document for `quarter`: `data/<quarter>/README.md`.
    pub fn readme_path(&self, quarter: Quarter) -> PathBuf {
        self.data()
            .join(quarter.to_string())
            .join(README_FILE_NAME)
    }

    /// Point the quarter-scoped paths at `new` instead of `old`.
    pub fn update_quarter(&mut self, old: Quarter, new: Quarter) {
        info!("Updating paths: replacing {old} with {new}");
        let (old, new) = (old.to_string(), new.to_string());

        for entry in &mut self.entries {
            if QUARTER_LABELS.contains(&entry.label.as_str()) {
                let replaced = entry.path.to_string_lossy().replace(&old, &new);
                entry.path = PathBuf::from(replaced);
            }
        }
    }

    /// Render `path` relative to the repository root as `./...`.
    pub fn display_relative(&self, path: &Path) -> String {
        match path.strip_prefix(self.repo()) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => format!("./{}", rel.display()),
            Err(_) => path.display().to_string(),
        }
    }

    /// Multi-line listing: the repo root first, everything else relative to it.
    pub fn render_log(&self) -> String {
        let mut out = String::from("PATHS:");
        for entry in &self.entries {
            let label = format!("{}:", entry.label);
            if entry.label == "repo" {
                let _ = write!(out, "\n{:4}{label} {}", "", entry.path.display());
            } else {
                let _ = write!(
                    out,
                    "\n{:8}{label:<15} {}",
                    "",
                    self.display_relative(&entry.path)
                );
            }
        }
        out
    }

    /// Emit the path table as one informational log event.
    pub fn log(&self) {
        info!("{}", self.render_log());
    }
}

/// Symlink-resolve `path` if it exists, otherwise make it lexically absolute.
fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_repo() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("qc-paths-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::canonicalize(&dir).unwrap()
    }

    fn q(label: &str) -> Quarter {
        label.parse().unwrap()
    }

    #[test]
    fn setup_builds_quarter_layout() {
        let repo = temp_repo();
        let table = PathTable::setup(&repo, "3-report", q("2024Q1")).unwrap();

        assert_eq!(table.repo(), repo.as_path());
        assert_eq!(table.get("dotenv").unwrap(), repo.join(".env"));
        assert_eq!(table.data(), repo.join("data"));
        assert_eq!(table.data_quarter(), repo.join("data/2024Q1"));
        assert_eq!(table.get("data_1-fetch").unwrap(), repo.join("data/2024Q1/1-fetch"));
        assert_eq!(table.data_phase(), repo.join("data/2024Q1/3-report"));
        assert_eq!(
            table.readme_path(q("2024Q1")),
            repo.join("data/2024Q1/README.md")
        );

        let labels: Vec<&str> = table.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "repo",
                "dotenv",
                "data",
                "data_1-fetch",
                "data_2-process",
                "data_3-report",
                "data_phase",
                "data_quarter",
            ]
        );

        std::fs::remove_dir_all(&repo).ok();
    }

    #[test]
    fn setup_rejects_unknown_phase_and_missing_repo() {
        let repo = temp_repo();
        let err = PathTable::setup(&repo, "4-publish", q("2024Q1")).unwrap_err();
        assert!(matches!(err, QuantifyingError::InvalidInput { .. }));

        let missing = repo.join("does-not-exist");
        let err = PathTable::setup(&missing, "1-fetch", q("2024Q1")).unwrap_err();
        assert!(matches!(err, QuantifyingError::Io { .. }));

        std::fs::remove_dir_all(&repo).ok();
    }

    #[test]
    fn update_quarter_moves_only_scoped_paths() {
        let repo = temp_repo();
        let mut table = PathTable::setup(&repo, "2-process", q("2024Q1")).unwrap();
        table.update_quarter(q("2024Q1"), q("2023Q4"));

        assert_eq!(table.data_quarter(), repo.join("data/2023Q4"));
        assert_eq!(table.data_phase(), repo.join("data/2023Q4/2-process"));
        assert_eq!(table.get("data_3-report").unwrap(), repo.join("data/2023Q4/3-report"));
        assert_eq!(table.data(), repo.join("data"));
        assert_eq!(table.repo(), repo.as_path());

        std::fs::remove_dir_all(&repo).ok();
    }

    #[test]
    fn log_listing_is_repo_relative() {
        let repo = temp_repo();
        let table = PathTable::setup(&repo, "1-fetch", q("2024Q2")).unwrap();
        let listing = table.render_log();

        assert!(listing.starts_with(&format!("PATHS:\n    repo: {}", repo.display())));
        assert!(listing.contains("\n        dotenv:         ./.env"));
        assert!(listing.contains("\n        data_quarter:   ./data/2024Q2"));
        assert_eq!(table.display_relative(&repo), ".");
        assert_eq!(table.display_relative(Path::new("/elsewhere/x")), "/elsewhere/x");

        std::fs::remove_dir_all(&repo).ok();
    }

    #[test]
    fn table_serializes_in_order() {
        let repo = temp_repo();
        let table = PathTable::setup(&repo, "3-report", q("2024Q1")).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 8);
        assert_eq!(arr[0]["label"], "repo");
        assert_eq!(arr[7]["label"], "data_quarter");

        std::fs::remove_dir_all(&repo).ok();
    }
}
