//! Frequency tables and numeric descriptive statistics.

use std::collections::HashMap;

use polars::prelude::{AnyValue, Column, DataFrame};
use serde::Serialize;
use tracing::{debug, info};

use nna_common::any_to_string;
use nna_model::{ColumnKind, ProfilingOptions, SentinelRegistry, VariableClass};
use nna_quality::real_values;

use crate::correlation::{CorrelationMatrix, correlation_matrix};

/// Most frequent values of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
    pub column: String,
    pub values: Vec<(String, usize)>,
}

/// Descriptive statistics over real values (nulls and sentinels excluded).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExploratoryProfile {
    /// Categorical columns available before the cap.
    pub categorical_total: usize,
    pub numeric_total: usize,
    pub frequencies: Vec<FrequencyTable>,
    /// Every numeric column with at least one real value.
    pub numeric: Vec<NumericSummary>,
    /// Numeric columns selected for histograms.
    pub histogram_columns: Vec<String>,
    /// Pairwise correlation over the columns in `numeric`.
    pub correlation: CorrelationMatrix,
}

/// Counts non-null values, most frequent first; ties keep first-seen order.
pub fn top_n_frequencies(column: &Column, n: usize) -> Vec<(String, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for idx in 0..column.len() {
        let value = match column.get(idx) {
            Ok(AnyValue::Null) | Err(_) => continue,
            Ok(value) => any_to_string(value),
        };
        match index.get(&value) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Statistics of the real values of a column; `None` when there are none.
pub fn describe_numeric(column: &Column, registry: &SentinelRegistry) -> Option<NumericSummary> {
    let mut values = real_values(column, registry);
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    });
    Some(NumericSummary {
        column: column.name().to_string(),
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

/// Frequency tables for the first categorical columns and statistics for
/// the numeric ones, within the configured caps.
pub fn exploratory_profile(
    df: &DataFrame,
    labels: &[(String, VariableClass)],
    registry: &SentinelRegistry,
    options: &ProfilingOptions,
) -> ExploratoryProfile {
    let categorical: Vec<&str> = labels
        .iter()
        .filter(|(_, label)| label.is_categorical())
        .map(|(name, _)| name.as_str())
        .collect();

    let mut profile = ExploratoryProfile {
        categorical_total: categorical.len(),
        ..ExploratoryProfile::default()
    };

    for name in categorical.iter().take(options.max_categorical) {
        let Ok(column) = df.column(name) else {
            debug!(column = %name, "categorical column no longer present");
            continue;
        };
        profile.frequencies.push(FrequencyTable {
            column: (*name).to_string(),
            values: top_n_frequencies(column, options.top_n),
        });
    }

    for column in df.get_columns() {
        if !ColumnKind::from_dtype(column.dtype()).is_numeric() {
            continue;
        }
        profile.numeric_total += 1;
        if let Some(summary) = describe_numeric(column, registry) {
            if profile.histogram_columns.len() < options.max_numeric {
                profile.histogram_columns.push(summary.column.clone());
            }
            profile.numeric.push(summary);
        }
    }

    let described: Vec<String> = profile
        .numeric
        .iter()
        .map(|summary| summary.column.clone())
        .collect();
    profile.correlation = correlation_matrix(df, &described, registry);

    info!(
        categorical = profile.categorical_total,
        numeric = profile.numeric_total,
        frequency_tables = profile.frequencies.len(),
        "exploratory profile"
    );
    profile
}
