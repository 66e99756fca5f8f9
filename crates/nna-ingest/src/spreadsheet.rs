//! Spreadsheet reading through calamine.

use std::path::Path;

use calamine::{Data, DataType, Reader, open_workbook_auto};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::frame_builder::{RawCell, RawTable};

/// Sheet holding the intervention records in the source workbooks.
pub const PREFERRED_SHEET: &str = "BD";

/// `BD` when present, otherwise the last sheet.
pub fn select_sheet(names: &[String]) -> Option<&str> {
    names
        .iter()
        .find(|name| name.as_str() == PREFERRED_SHEET)
        .or_else(|| names.last())
        .map(String::as_str)
}

fn to_raw(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::from_text(s),
        Data::Int(v) => RawCell::Int(*v),
        Data::Float(v) => RawCell::Float(*v),
        Data::Bool(v) => RawCell::Bool(*v),
        other => match other.as_date() {
            Some(date) => RawCell::Date(date),
            None => RawCell::from_text(&other.to_string()),
        },
    }
}

/// Reads the selected sheet of an `.xlsx`/`.xls` workbook.
///
/// Returns the raw table and the sheet name that was read.
pub fn read_spreadsheet_raw(path: &Path) -> Result<(RawTable, String)> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::Spreadsheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let names = workbook.sheet_names();
    let sheet = select_sheet(&names)
        .ok_or_else(|| IngestError::NoSheets {
            path: path.to_path_buf(),
        })?
        .to_string();
    debug!(path = %path.display(), sheet = %sheet, sheets = names.len(), "selected sheet");

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| IngestError::Spreadsheet {
            path: path.to_path_buf(),
            message: format!("sheet {sheet}: {e}"),
        })?;

    let rows: Vec<Vec<RawCell>> = range
        .rows()
        .map(|row| row.iter().map(to_raw).collect())
        .collect();
    let table = RawTable::from_rows(rows).ok_or_else(|| IngestError::EmptyTable {
        path: path.to_path_buf(),
    })?;
    Ok((table, sheet))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn prefers_bd_sheet() {
        let sheets = names(&["Resumen", "BD", "Notas"]);
        assert_eq!(select_sheet(&sheets), Some("BD"));
    }

    #[test]
    fn falls_back_to_last_sheet() {
        let sheets = names(&["Hoja1", "bd", "Datos"]);
        assert_eq!(select_sheet(&sheets), Some("Datos"));
        assert_eq!(select_sheet(&[]), None);
    }

    #[test]
    fn error_cells_are_empty() {
        assert_eq!(
            to_raw(&Data::Error(calamine::CellErrorType::NA)),
            RawCell::Empty
        );
        assert_eq!(to_raw(&Data::String("  ".to_string())), RawCell::Empty);
        assert_eq!(to_raw(&Data::Float(2.5)), RawCell::Float(2.5));
    }
}
