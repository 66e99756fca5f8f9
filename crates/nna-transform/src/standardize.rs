//! Canonical spellings for yes/no and not-applicable categories.

use std::collections::HashSet;

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PolarsResult, Series};
use serde::Serialize;
use tracing::info;

use nna_common::column_strings;
use nna_model::{CleaningOptions, SentinelRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardizedColumn {
    pub column: String,
    pub replaced: usize,
}

struct Vocabulary {
    affirmative: HashSet<String>,
    negative: HashSet<String>,
    not_applicable: HashSet<String>,
}

impl Vocabulary {
    fn new(options: &CleaningOptions) -> Self {
        let lower = |values: &[String]| values.iter().map(|v| v.trim().to_lowercase()).collect();
        Self {
            affirmative: lower(&options.affirmative_variants),
            negative: lower(&options.negative_variants),
            not_applicable: lower(&options.not_applicable_variants),
        }
    }
}

fn canonical<'a>(
    value: &str,
    vocabulary: &Vocabulary,
    options: &'a CleaningOptions,
    registry: &'a SentinelRegistry,
) -> Option<&'a str> {
    if registry.is_sentinel_text(value) {
        return None;
    }
    let key = value.trim().to_lowercase();
    if vocabulary.affirmative.contains(&key) {
        Some(options.affirmative_token.as_str())
    } else if vocabulary.negative.contains(&key) {
        Some(options.negative_token.as_str())
    } else if vocabulary.not_applicable.contains(&key) {
        Some(registry.primary().literal())
    } else {
        None
    }
}

/// Maps yes/no variants to the canonical tokens and not-applicable
/// variants to the primary sentinel code, in text columns with fewer
/// distinct values than the configured threshold.
///
/// Registered sentinel codes pass through unchanged.
pub fn standardize_categories(
    df: &DataFrame,
    options: &CleaningOptions,
    registry: &SentinelRegistry,
) -> PolarsResult<(DataFrame, Vec<StandardizedColumn>)> {
    let vocabulary = Vocabulary::new(options);
    let mut changed = Vec::new();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        if column.dtype() != &DataType::String {
            columns.push(column.clone());
            continue;
        }
        let values = column_strings(column);
        let distinct: HashSet<&str> = values.iter().flatten().map(String::as_str).collect();
        if distinct.len() >= options.standardize_max_distinct {
            columns.push(column.clone());
            continue;
        }

        let mut replaced = 0usize;
        let mapped: Vec<Option<String>> = values
            .iter()
            .map(|value| {
                let text = value.as_deref()?;
                match canonical(text, &vocabulary, options, registry) {
                    Some(token) if token != text => {
                        replaced += 1;
                        Some(token.to_string())
                    }
                    _ => Some(text.to_string()),
                }
            })
            .collect();
        if replaced == 0 {
            columns.push(column.clone());
            continue;
        }
        columns.push(Series::new(column.name().clone(), mapped).into());
        changed.push(StandardizedColumn {
            column: column.name().to_string(),
            replaced,
        });
    }
    info!(
        columns = changed.len(),
        cells = changed.iter().map(|c| c.replaced).sum::<usize>(),
        "standardized categories"
    );
    Ok((DataFrame::new(columns)?, changed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{AnyValue, df};

    fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        column_strings(df.column(name).unwrap())
    }

    #[test]
    fn affirmative_variants_collapse() {
        let df = df! { "ASISTE" => &["Si", "si", "SI", "1"] }.unwrap();
        let (out, changed) = standardize_categories(
            &df,
            &CleaningOptions::default(),
            &SentinelRegistry::default(),
        )
        .unwrap();
        assert_eq!(strings(&out, "ASISTE"), vec![Some("YES".to_string()); 4]);
        assert_eq!(changed[0].replaced, 4);
    }

    #[test]
    fn sentinel_and_not_applicable() {
        let df = df! {
            "ESTADO" => &[Some("99999"), Some("No aplica"), Some("N/A"), Some("no"), None, Some("Otro")],
        }
        .unwrap();
        let (out, _) = standardize_categories(
            &df,
            &CleaningOptions::default(),
            &SentinelRegistry::default(),
        )
        .unwrap();
        let column = out.column("ESTADO").unwrap();
        assert_eq!(column.get(0).unwrap(), AnyValue::String("99999"));
        assert_eq!(column.get(1).unwrap(), AnyValue::String("99999"));
        assert_eq!(column.get(2).unwrap(), AnyValue::String("99999"));
        assert_eq!(column.get(3).unwrap(), AnyValue::String("NO"));
        assert_eq!(column.get(4).unwrap(), AnyValue::Null);
        assert_eq!(column.get(5).unwrap(), AnyValue::String("Otro"));
    }

    #[test]
    fn sentinel_code_one_is_not_remapped() {
        let df = df! { "FLAG" => &["1", "0", "si"] }.unwrap();
        let registry = SentinelRegistry::with_codes(["1"]);
        let (out, _) =
            standardize_categories(&df, &CleaningOptions::default(), &registry).unwrap();
        assert_eq!(
            strings(&out, "FLAG"),
            vec![Some("1".to_string()), Some("NO".to_string()), Some("YES".to_string())]
        );
    }

    #[test]
    fn wide_columns_are_skipped() {
        let values: Vec<String> = (0..25).map(|i| format!("v{i}")).chain(["si".to_string()]).collect();
        let df = df! { "OBS" => values }.unwrap();
        let (out, changed) = standardize_categories(
            &df,
            &CleaningOptions::default(),
            &SentinelRegistry::default(),
        )
        .unwrap();
        assert!(changed.is_empty());
        assert_eq!(out.column("OBS").unwrap().get(25).unwrap(), AnyValue::String("si"));
    }
}
