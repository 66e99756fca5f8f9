//! Quality and missingness engine.
//!
//! Separates genuine nulls from registered sentinel codes, profiles each
//! column, classifies it into one semantic label and assembles the quality
//! report. Functions only read the table; [`drop_duplicates`] returns a
//! new frame.

mod classify;
mod duplicates;
mod missingness;
mod numeric;
mod profile;
mod report;

pub use classify::{classify, classify_profile, flag_problems, flags_for_profile};
pub use duplicates::{drop_duplicates, duplicate_count, first_occurrence_mask};
pub use missingness::{ColumnSentinels, effective_missing, sentinel_stats, true_null_stats};
pub use numeric::{coerce_f64, coerce_i64, float_values, integer_values, real_values};
pub use profile::{ColumnProfile, profile_column, profile_table};
pub use report::{build_dictionary, build_quality_report, missing_ranking};
