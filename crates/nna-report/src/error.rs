//! Error types for output writing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing run artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to create an output directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write CSV records.
    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to build or save a workbook.
    #[error("failed to write workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Failed to serialize a JSON document.
    #[error("failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Table does not fit the target format.
    #[error("table too large for {path}: {rows} rows, {columns} columns")]
    TooLarge {
        path: PathBuf,
        rows: usize,
        columns: usize,
    },
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportError::Workbook {
            path: PathBuf::from("out/data/base.xlsx"),
            message: "sheet name too long".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to write workbook out/data/base.xlsx: sheet name too long"
        );
    }
}
