//! JSON documents.

use std::path::Path;

use chrono::{Local, NaiveDateTime};
use polars::prelude::DataFrame;
use serde::Serialize;

use crate::error::{ReportError, Result};

/// Pretty-prints `value` followed by a trailing newline.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, format!("{json}\n")).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Final facts about the exported table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    #[serde(with = "processing_date")]
    pub processing_date: NaiveDateTime,
    pub final_rows: usize,
    pub final_columns: usize,
    pub size_mb: f64,
    pub output_file: String,
}

impl RunSummary {
    pub fn from_frame(df: &DataFrame, output_file: &Path) -> Self {
        let size_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
        Self {
            processing_date: Local::now().naive_local(),
            final_rows: df.height(),
            final_columns: df.width(),
            size_mb: (size_mb * 100.0).round() / 100.0,
            output_file: output_file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

mod processing_date {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, df};

    #[test]
    fn run_summary_names_the_output_file() {
        let df = df! { "A" => &[1i64, 2, 3] }.unwrap();
        let summary = RunSummary::from_frame(&df, Path::new("out/data/base_nna_limpia.xlsx"));
        assert_eq!(summary.final_rows, 3);
        assert_eq!(summary.final_columns, 1);
        assert_eq!(summary.output_file, "base_nna_limpia.xlsx");

        let value = serde_json::to_value(&summary).unwrap();
        let date = value["processing_date"].as_str().unwrap();
        assert_eq!(date.len(), "2025-01-01 00:00:00".len());
    }

    #[test]
    fn json_ends_with_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &vec![1, 2]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("]\n"));
    }
}
