//! Output writers for the NNA pipeline.
//!
//! - **Cleaned table**: CSV (UTF-8 with byte-order mark) and XLSX
//! - **JSON**: column mapping, quality report, run summary
//! - **CSV tables**: dictionary, missingness, statistics, frequencies,
//!   locality by year tables, crosstabs
//! - **Markdown**: narrative summary

mod bundle;
mod delimited;
mod error;
mod json;
mod layout;
mod markdown;
mod tables;
mod workbook;

pub use bundle::{ReportInputs, WrittenReports, write_reports};
pub use delimited::{format_percent, write_frame_csv, write_table_csv};
pub use error::{ReportError, Result};
pub use json::{RunSummary, write_json};
pub use layout::{CLEANED_BASENAME, OutputLayout, file_stem};
pub use markdown::{render_summary, write_summary_markdown};
pub use tables::{
    write_column_mapping, write_correlation_matrix, write_crosstabs, write_dictionary,
    write_frequencies, write_missing_report, write_numeric_stats, write_quality_report,
    write_spatiotemporal,
};
pub use workbook::{CLEANED_SHEET, write_frame_xlsx};
