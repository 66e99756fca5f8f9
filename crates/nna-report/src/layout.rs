//! Output directory layout.

use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

/// Base name of the cleaned table in both encodings.
pub const CLEANED_BASENAME: &str = "base_nna_limpia";

/// Paths of every artifact a run writes under its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.root.join("tables")
    }

    /// Creates the root, `data/` and `tables/` directories.
    pub fn create(&self) -> Result<()> {
        for dir in [self.root.clone(), self.data_dir(), self.tables_dir()] {
            std::fs::create_dir_all(&dir)
                .map_err(|source| ReportError::CreateDir { path: dir, source })?;
        }
        Ok(())
    }

    pub fn cleaned_csv(&self) -> PathBuf {
        self.data_dir().join(format!("{CLEANED_BASENAME}.csv"))
    }

    pub fn cleaned_xlsx(&self) -> PathBuf {
        self.data_dir().join(format!("{CLEANED_BASENAME}.xlsx"))
    }

    /// Path of a file under `tables/`.
    pub fn table(&self, file_name: &str) -> PathBuf {
        self.tables_dir().join(file_name)
    }

    pub fn summary_markdown(&self) -> PathBuf {
        self.root.join("summary.md")
    }

    pub fn run_summary(&self) -> PathBuf {
        self.root.join("run_summary.json")
    }

    pub fn run_log_text(&self) -> PathBuf {
        self.root.join("run_log.txt")
    }

    pub fn run_log_json(&self) -> PathBuf {
        self.root.join("run_log.json")
    }
}

/// File-safe form of a column or analysis name.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_root() {
        let layout = OutputLayout::new("/tmp/run");
        assert_eq!(
            layout.cleaned_csv(),
            PathBuf::from("/tmp/run/data/base_nna_limpia.csv")
        );
        assert_eq!(
            layout.table("missing_report.csv"),
            PathBuf::from("/tmp/run/tables/missing_report.csv")
        );
        assert_eq!(layout.run_log_json(), PathBuf::from("/tmp/run/run_log.json"));
    }

    #[test]
    fn file_stem_replaces_unsafe_characters() {
        assert_eq!(file_stem("TIPO_DE_INTERVENCION"), "TIPO_DE_INTERVENCION");
        assert_eq!(file_stem("a/b c"), "a_b_c");
        assert_eq!(file_stem(""), "unnamed");
    }
}
