//! Shared utilities for the NNA pipeline crates.
//!
//! Every crate reads cells out of polars frames the same way: a null is a
//! true absence, everything else has a canonical string form and an
//! optional numeric form. Keeping that in one place means the quality
//! engine, the transforms, and the writers never disagree about what a
//! cell "is".

mod values;

pub use values::{
    any_to_date, any_to_f64, any_to_i64, any_to_string, column_strings, format_numeric,
    is_null_value, parse_f64, parse_i64,
};
