//! Spreadsheet export of the cleaned table.

use std::path::Path;

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use nna_common::any_to_string;

use crate::error::{ReportError, Result};

/// Sheet name the loader prefers, so a re-load picks the same table.
pub const CLEANED_SHEET: &str = "BD";

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Writes `df` to a single-sheet workbook with a bold header row.
///
/// Numbers and booleans keep their cell type; dates are written as ISO
/// text; nulls are left blank.
pub fn write_frame_xlsx(path: &Path, df: &DataFrame) -> Result<()> {
    if df.height() + 1 > MAX_ROWS || df.width() > MAX_COLUMNS {
        return Err(ReportError::TooLarge {
            path: path.to_path_buf(),
            rows: df.height(),
            columns: df.width(),
        });
    }
    let workbook_error = |err: XlsxError| ReportError::Workbook {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(CLEANED_SHEET).map_err(workbook_error)?;
    fill_sheet(sheet, df).map_err(workbook_error)?;
    workbook.save(path).map_err(workbook_error)
}

fn fill_sheet(sheet: &mut Worksheet, df: &DataFrame) -> std::result::Result<(), XlsxError> {
    let header = Format::new().set_bold();
    for (col, column) in df.get_columns().iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, column.name().as_str(), &header)?;
        for idx in 0..df.height() {
            let row = idx as u32 + 1;
            match column.get(idx).unwrap_or(AnyValue::Null) {
                AnyValue::Null => {}
                AnyValue::Boolean(value) => {
                    sheet.write_boolean(row, col, value)?;
                }
                AnyValue::Int8(v) => write_number(sheet, row, col, f64::from(v))?,
                AnyValue::Int16(v) => write_number(sheet, row, col, f64::from(v))?,
                AnyValue::Int32(v) => write_number(sheet, row, col, f64::from(v))?,
                AnyValue::Int64(v) => write_number(sheet, row, col, v as f64)?,
                AnyValue::UInt8(v) => write_number(sheet, row, col, f64::from(v))?,
                AnyValue::UInt16(v) => write_number(sheet, row, col, f64::from(v))?,
                AnyValue::UInt32(v) => write_number(sheet, row, col, f64::from(v))?,
                AnyValue::UInt64(v) => write_number(sheet, row, col, v as f64)?,
                AnyValue::Float32(v) => write_number(sheet, row, col, f64::from(v))?,
                AnyValue::Float64(v) => write_number(sheet, row, col, v)?,
                other => {
                    sheet.write_string(row, col, any_to_string(other))?;
                }
            }
        }
    }
    Ok(())
}

fn write_number(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: f64,
) -> std::result::Result<(), XlsxError> {
    sheet.write_number(row, col, value)?;
    Ok(())
}
