//! Table transforms applied between the two quality audits.
//!
//! Each stage takes the current frame by reference and returns a new frame
//! plus a record of what changed. Sentinel cells are never rewritten.

mod impute;
mod standardize;
mod temporal;
mod text;

pub use impute::{ImputedColumn, impute_categorical};
pub use standardize::{StandardizedColumn, standardize_categories};
pub use temporal::{TemporalFailure, TemporalInfo, detect_temporal_columns, parse_date};
pub use text::{NULL_TOKENS, TextCleanup, clean_text};
