//! Input file loading.

use std::path::Path;

use polars::prelude::DataFrame;
use tracing::{info, info_span};

use crate::csv::read_csv_raw;
use crate::error::{IngestError, Result};
use crate::frame_builder::build_frame;
use crate::spreadsheet::read_spreadsheet_raw;

/// Accepted input formats, chosen by extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Xlsx,
    Xls,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }

    pub fn is_spreadsheet(self) -> bool {
        matches!(self, Self::Xlsx | Self::Xls)
    }
}

/// A freshly loaded table plus how it was read.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub frame: DataFrame,
    pub format: InputFormat,
    /// Sheet read from a workbook.
    pub sheet: Option<String>,
    /// Delimiter used for a CSV file.
    pub delimiter: Option<u8>,
    /// Estimated in-memory size in bytes.
    pub memory_bytes: usize,
    /// Header text as found in the file, one per frame column.
    ///
    /// Frame names are made unique on load (`X`, `X.1`); normalization
    /// works from these so repeated headers surface as collisions.
    pub source_headers: Vec<String>,
}

impl LoadedTable {
    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Loads `.csv`, `.xlsx` or `.xls` into a DataFrame.
pub fn load_table(path: &Path) -> Result<LoadedTable> {
    let span = info_span!("load_table", path = %path.display());
    let _guard = span.enter();

    let format = InputFormat::from_path(path)?;
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let (raw, sheet, delimiter) = if format.is_spreadsheet() {
        let (raw, sheet) = read_spreadsheet_raw(path)?;
        (raw, Some(sheet), None)
    } else {
        let (raw, delimiter) = read_csv_raw(path)?;
        (raw, None, Some(delimiter))
    };

    let frame = build_frame(&raw)?;
    let memory_bytes = frame.estimated_size();
    info!(
        rows = frame.height(),
        columns = frame.width(),
        sheet = sheet.as_deref().unwrap_or("-"),
        memory_mb = memory_bytes as f64 / (1024.0 * 1024.0),
        "loaded input table"
    );

    Ok(LoadedTable {
        frame,
        format,
        sheet,
        delimiter,
        memory_bytes,
        source_headers: raw.source_headers,
    })
}
