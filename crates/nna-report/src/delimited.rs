//! CSV writers.
//!
//! The cleaned table carries a UTF-8 byte-order mark so spreadsheet tools
//! open accented text correctly; derived tables are plain UTF-8.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use polars::prelude::{AnyValue, DataFrame};

use nna_common::any_to_string;

use crate::error::{ReportError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn create(path: &Path, bom: bool) -> Result<csv::Writer<BufWriter<File>>> {
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_error)?;
    let mut buffer = BufWriter::new(file);
    if bom {
        buffer.write_all(UTF8_BOM).map_err(write_error)?;
    }
    Ok(csv::Writer::from_writer(buffer))
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> ReportError + '_ {
    move |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes the frame with a header row; nulls become empty fields.
pub fn write_frame_csv(path: &Path, df: &DataFrame) -> Result<()> {
    let mut writer = create(path, true)?;
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    writer.write_record(&headers).map_err(csv_error(path))?;

    let columns = df.get_columns();
    let mut record: Vec<String> = Vec::with_capacity(columns.len());
    for idx in 0..df.height() {
        record.clear();
        for column in columns {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            record.push(any_to_string(value));
        }
        writer.write_record(&record).map_err(csv_error(path))?;
    }
    writer.flush().map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a derived table from already formatted cells.
pub fn write_table_csv<H, R>(path: &Path, headers: &[H], rows: R) -> Result<()>
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut writer = create(path, false)?;
    writer
        .write_record(headers.iter().map(AsRef::as_ref))
        .map_err(csv_error(path))?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error(path))?;
    }
    writer.flush().map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Two-decimal rendering used for every percentage column.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, df};

    #[test]
    fn frame_csv_starts_with_bom_and_writes_nulls_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.csv");
        let df = df! {
            "LOCALIDAD" => &[Some("Suba"), None],
            "ANO" => &[Some(2021i64), Some(2022)],
        }
        .unwrap();
        write_frame_csv(&path, &df).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "LOCALIDAD,ANO\nSuba,2021\n,2022\n");
    }

    #[test]
    fn table_csv_has_no_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        write_table_csv(&path, &["a", "b"], vec![vec!["1".to_string(), "x, y".to_string()]])
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "a,b\n1,\"x, y\"\n");
    }

    #[test]
    fn percent_has_two_decimals() {
        assert_eq!(format_percent(33.3333), "33.33");
        assert_eq!(format_percent(0.0), "0.00");
    }
}
