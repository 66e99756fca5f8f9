//! NNA data ingestion.
//!
//! This crate loads the raw intervention extract into a Polars DataFrame and
//! prepares its schema for profiling.
//!
//! # Features
//!
//! - **Loading**: `.csv` (delimiter sniffed) and `.xlsx`/`.xls` (sheet `BD`
//!   or the last sheet) with per-column dtype inference
//! - **Column Normalization**: canonical upper-case names with a rename
//!   mapping and collision detection
//! - **PII Removal**: drops personal-data columns and hashes identifiers
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use nna_ingest::{load_table, normalize_columns_from, strip_pii};
//! use nna_model::PiiPolicy;
//!
//! let loaded = load_table(Path::new("data/raw/base.xlsx"))?;
//! let (df, mapping) = normalize_columns_from(&loaded.frame, &loaded.source_headers)?;
//! let (df, pii) = strip_pii(&df, &PiiPolicy::default())?;
//! ```

mod csv;
mod error;
mod frame_builder;
mod loader;
mod normalize;
mod pii;
mod spreadsheet;

// === Error Types ===
pub use error::{IngestError, Result};

// === Loading ===
pub use csv::{DELIMITER_CANDIDATES, read_csv_raw, sniff_delimiter};
pub use frame_builder::{RawCell, RawTable, build_frame};
pub use loader::{InputFormat, LoadedTable, load_table};
pub use spreadsheet::{PREFERRED_SHEET, read_spreadsheet_raw, select_sheet};

// === Schema Preparation ===
pub use normalize::{
    ColumnMapping, NameCollision, normalize_columns, normalize_columns_from, normalize_name,
};
pub use pii::{PiiReport, hash_identifier, strip_pii};
