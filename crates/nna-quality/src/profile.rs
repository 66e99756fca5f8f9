//! Per-column content statistics shared by classification and reporting.

use std::collections::HashSet;

use polars::prelude::{AnyValue, Column, DataFrame};

use nna_common::any_to_string;
use nna_model::{ColumnKind, NullStat};

/// Content statistics of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub dtype: String,
    pub rows: usize,
    pub nulls: NullStat,
    /// Distinct non-null values.
    pub distinct: usize,
    pub sample: Option<String>,
}

impl ColumnProfile {
    /// Distinct count over row count, 0-100.
    pub fn cardinality_percentage(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.distinct as f64 / self.rows as f64 * 100.0
        }
    }
}

pub fn profile_column(column: &Column) -> ColumnProfile {
    let rows = column.len();
    let mut seen: HashSet<String> = HashSet::new();
    let mut sample = None;
    for idx in 0..rows {
        let value = match column.get(idx) {
            Ok(AnyValue::Null) | Err(_) => continue,
            Ok(value) => any_to_string(value),
        };
        if sample.is_none() {
            sample = Some(value.clone());
        }
        seen.insert(value);
    }
    ColumnProfile {
        name: column.name().to_string(),
        kind: ColumnKind::from_dtype(column.dtype()),
        dtype: column.dtype().to_string(),
        rows,
        nulls: NullStat::new(column.null_count(), rows),
        distinct: seen.len(),
        sample,
    }
}

pub fn profile_table(df: &DataFrame) -> Vec<ColumnProfile> {
    df.get_columns().iter().map(profile_column).collect()
}
