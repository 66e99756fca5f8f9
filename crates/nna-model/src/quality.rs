//! Quality report snapshot types.
//!
//! Produced by the quality engine from an immutable view of the table and
//! persisted as JSON. Percentages are on a 0-100 scale over the row count.

use serde::{Deserialize, Serialize};

use crate::classification::{ProblemFlag, VariableClass};
use crate::column::ColumnKind;

/// Count and percentage of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NullStat {
    pub count: usize,
    pub percentage: f64,
}

impl NullStat {
    /// Builds the stat; an empty table yields 0 % rather than NaN.
    pub fn new(count: usize, rows: usize) -> Self {
        let percentage = if rows == 0 {
            0.0
        } else {
            count as f64 / rows as f64 * 100.0
        };
        Self { count, percentage }
    }
}

/// Matches of one sentinel code in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelStat {
    pub code: String,
    pub count: usize,
    pub percentage: f64,
}

/// Per-column quality attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnQuality {
    pub name: String,
    pub kind: ColumnKind,
    /// Genuine absent markers only.
    pub nulls: NullStat,
    /// Only codes with at least one match.
    pub sentinels: Vec<SentinelStat>,
    /// True nulls plus sentinel matches: what is left without a real value.
    pub effective_missing: NullStat,
    pub distinct: usize,
    pub constant: bool,
    pub near_empty: bool,
    pub high_cardinality: bool,
}

impl ColumnQuality {
    pub fn flags(&self) -> Vec<ProblemFlag> {
        let mut flags = Vec::new();
        if self.constant {
            flags.push(ProblemFlag::Constant);
        }
        if self.near_empty {
            flags.push(ProblemFlag::NearEmpty);
        }
        if self.high_cardinality {
            flags.push(ProblemFlag::HighCardinality);
        }
        flags
    }

    pub fn sentinel_count(&self) -> usize {
        self.sentinels.iter().map(|stat| stat.count).sum()
    }
}

/// A column carrying at least one problem flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemColumn {
    pub column: String,
    pub problems: Vec<ProblemFlag>,
}

/// Dataset-level quality snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_rows: usize,
    pub total_columns: usize,
    pub duplicate_rows: usize,
    pub duplicate_percentage: f64,
    pub average_null_percentage: f64,
    pub constant_columns: usize,
    pub near_empty_columns: usize,
    /// Informational only.
    pub memory_mb: f64,
    pub columns: Vec<ColumnQuality>,
    pub problem_columns: Vec<ProblemColumn>,
}

impl QualityReport {
    pub fn column(&self, name: &str) -> Option<&ColumnQuality> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn total_sentinels(&self) -> usize {
        self.columns.iter().map(ColumnQuality::sentinel_count).sum()
    }
}

/// One row of the variable dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub variable: String,
    pub kind: ColumnKind,
    pub dtype: String,
    pub null_count: usize,
    pub null_percentage: f64,
    pub distinct: usize,
    pub cardinality_percentage: f64,
    pub sample_value: Option<String>,
    pub classification: VariableClass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_stat_on_empty_table_is_zero() {
        let stat = NullStat::new(0, 0);
        assert_eq!(stat.percentage, 0.0);
    }

    #[test]
    fn null_stat_percentage() {
        let stat = NullStat::new(1, 3);
        assert!((stat.percentage - 33.333).abs() < 0.01);
    }
}
