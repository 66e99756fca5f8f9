//! CSV file reading into raw cells.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::frame_builder::{RawCell, RawTable};

use super::sniff::sniff_delimiter;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Rejects UTF-16 input and strips a UTF-8 BOM.
fn decode(path: &Path, bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(IngestError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding: "UTF-16 LE",
        });
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(IngestError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding: "UTF-16 BE",
        });
    }
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8(body.to_vec()).map_err(|_| IngestError::UnsupportedEncoding {
        path: path.to_path_buf(),
        encoding: "non-UTF-8",
    })
}

/// Reads a CSV file with a sniffed delimiter.
///
/// Returns the raw table and the delimiter that was used.
pub fn read_csv_raw(path: &Path) -> Result<(RawTable, u8)> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let text = decode(path, &bytes)?;
    let delimiter = sniff_delimiter(&text);
    debug!(
        path = %path.display(),
        delimiter = %char::from(delimiter).escape_default(),
        "sniffed CSV delimiter"
    );

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        rows.push(record.iter().map(RawCell::from_text).collect());
    }

    let table = RawTable::from_rows(rows).ok_or_else(|| IngestError::EmptyTable {
        path: path.to_path_buf(),
    })?;
    Ok((table, delimiter))
}
