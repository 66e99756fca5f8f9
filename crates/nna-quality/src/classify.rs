//! Variable classification and problem flags.
//!
//! Both read the uncleaned null state. Sentinel cells count as values: a
//! column full of `99999` is constant, not near-empty.

use polars::prelude::DataFrame;

use nna_model::{ProblemColumn, ProblemFlag, QualityThresholds, VariableClass};

use crate::profile::{ColumnProfile, profile_table};

/// First matching rule wins, in [`VariableClass`] order.
pub fn classify_profile(profile: &ColumnProfile, thresholds: &QualityThresholds) -> VariableClass {
    if profile.nulls.percentage > thresholds.near_empty_percent {
        VariableClass::NearEmpty
    } else if profile.distinct == 1 {
        VariableClass::Constant
    } else if profile.rows > 0 && profile.distinct == profile.rows {
        VariableClass::Identifier
    } else if profile.distinct <= thresholds.categorical_low_max {
        VariableClass::CategoricalLow
    } else if profile.distinct <= thresholds.categorical_medium_max {
        VariableClass::CategoricalMedium
    } else if profile.cardinality_percentage() > thresholds.high_cardinality_percent
        && profile.kind.is_textual()
    {
        VariableClass::HighCardinality
    } else if profile.kind.is_numeric() {
        VariableClass::Numeric
    } else {
        VariableClass::CategoricalHigh
    }
}

/// Independent flags; a column may carry several.
pub fn flags_for_profile(profile: &ColumnProfile, thresholds: &QualityThresholds) -> Vec<ProblemFlag> {
    let mut flags = Vec::new();
    if profile.distinct == 1 {
        flags.push(ProblemFlag::Constant);
    }
    if profile.nulls.percentage > thresholds.near_empty_percent {
        flags.push(ProblemFlag::NearEmpty);
    }
    if profile.kind.is_textual()
        && profile.distinct as f64 > thresholds.high_cardinality_ratio * profile.rows as f64
    {
        flags.push(ProblemFlag::HighCardinality);
    }
    flags
}

/// One label per column, in table order.
pub fn classify(df: &DataFrame, thresholds: &QualityThresholds) -> Vec<(String, VariableClass)> {
    profile_table(df)
        .iter()
        .map(|profile| (profile.name.clone(), classify_profile(profile, thresholds)))
        .collect()
}

/// Flags of every column, including columns without any.
pub fn flag_problems(df: &DataFrame, thresholds: &QualityThresholds) -> Vec<ProblemColumn> {
    profile_table(df)
        .iter()
        .map(|profile| ProblemColumn {
            column: profile.name.clone(),
            problems: flags_for_profile(profile, thresholds),
        })
        .collect()
}
