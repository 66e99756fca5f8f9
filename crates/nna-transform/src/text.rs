//! Whitespace cleanup and null-token conversion for text columns.

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PolarsResult, Series};
use serde::Serialize;
use tracing::debug;

use nna_common::column_strings;

/// Spellings of "no value" that become true nulls.
pub const NULL_TOKENS: [&str; 6] = ["nan", "None", "", "null", "NULL", "NA"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextCleanup {
    pub columns: usize,
    /// Cells turned into nulls.
    pub nulled: usize,
    /// Cells whose spacing changed.
    pub trimmed: usize,
}

fn clean_value(value: &str) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if NULL_TOKENS.contains(&collapsed.as_str()) {
        None
    } else {
        Some(collapsed)
    }
}

/// Trims, collapses internal whitespace and nulls [`NULL_TOKENS`] in every
/// `String` column.
pub fn clean_text(df: &DataFrame) -> PolarsResult<(DataFrame, TextCleanup)> {
    let mut summary = TextCleanup::default();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        if column.dtype() != &DataType::String {
            columns.push(column.clone());
            continue;
        }
        summary.columns += 1;
        let values: Vec<Option<String>> = column_strings(column)
            .into_iter()
            .map(|value| {
                let raw = value?;
                let cleaned = clean_value(&raw);
                match &cleaned {
                    None => summary.nulled += 1,
                    Some(text) if *text != raw => summary.trimmed += 1,
                    Some(_) => {}
                }
                cleaned
            })
            .collect();
        columns.push(Series::new(column.name().clone(), values).into());
    }
    debug!(
        columns = summary.columns,
        nulled = summary.nulled,
        trimmed = summary.trimmed,
        "cleaned text columns"
    );
    Ok((DataFrame::new(columns)?, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("  Suba   Norte "), Some("Suba Norte".to_string()));
        assert_eq!(clean_value(" nan "), None);
        assert_eq!(clean_value("   "), None);
        assert_eq!(clean_value("NA"), None);
        assert_eq!(clean_value("na"), Some("na".to_string()));
        assert_eq!(clean_value("99999"), Some("99999".to_string()));
    }

    #[test]
    fn test_clean_text_only_touches_strings() {
        let df = df! {
            "T" => &[Some(" a  b"), Some("None"), None, Some("99999")],
            "N" => &[Some(1i64), None, Some(3), Some(4)],
        }
        .unwrap();
        let (cleaned, summary) = clean_text(&df).unwrap();
        assert_eq!(summary.columns, 1);
        assert_eq!(summary.nulled, 1);
        assert_eq!(summary.trimmed, 1);
        assert_eq!(cleaned.column("T").unwrap().null_count(), 2);
        assert_eq!(cleaned.column("N").unwrap().null_count(), 1);
        assert_eq!(
            cleaned.column("T").unwrap().get(3).unwrap(),
            polars::prelude::AnyValue::String("99999")
        );
    }
}
