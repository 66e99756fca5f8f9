//! CSV reading utilities.

mod reader;
mod sniff;

pub use reader::read_csv_raw;
pub use sniff::{DELIMITER_CANDIDATES, sniff_delimiter};
