//! Placeholder imputation of partially missing text columns.

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PolarsResult, Series};
use serde::Serialize;
use tracing::info;

use nna_common::column_strings;
use nna_model::{CleaningOptions, NullStat};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputedColumn {
    pub column: String,
    pub filled: usize,
    pub null_percentage: f64,
}

/// Fills true nulls of text columns whose null percentage lies strictly
/// between 0 and the configured ceiling.
///
/// Columns at or above the ceiling are left alone; sentinel cells are not
/// nulls and are never filled.
pub fn impute_categorical(
    df: &DataFrame,
    options: &CleaningOptions,
) -> PolarsResult<(DataFrame, Vec<ImputedColumn>)> {
    let rows = df.height();
    let mut imputed = Vec::new();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let nulls = NullStat::new(column.null_count(), rows);
        let eligible = column.dtype() == &DataType::String
            && nulls.count > 0
            && nulls.percentage < options.impute_ceiling_percent;
        if !eligible {
            columns.push(column.clone());
            continue;
        }
        let values: Vec<String> = column_strings(column)
            .into_iter()
            .map(|value| value.unwrap_or_else(|| options.placeholder.clone()))
            .collect();
        columns.push(Series::new(column.name().clone(), values).into());
        imputed.push(ImputedColumn {
            column: column.name().to_string(),
            filled: nulls.count,
            null_percentage: nulls.percentage,
        });
    }
    info!(
        columns = imputed.len(),
        cells = imputed.iter().map(|c| c.filled).sum::<usize>(),
        placeholder = %options.placeholder,
        "imputed categorical nulls"
    );
    Ok((DataFrame::new(columns)?, imputed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{AnyValue, df};

    #[test]
    fn fills_only_below_ceiling() {
        let df = df! {
            "LOW" => &[Some("a"), None, Some("99999"), Some("b")],
            "HALF" => &[Some("a"), None, None, Some("b")],
            "FULL" => &[Some("a"), Some("b"), Some("c"), Some("d")],
            "NUM" => &[Some(1i64), None, Some(2), Some(3)],
        }
        .unwrap();
        let (out, imputed) = impute_categorical(&df, &CleaningOptions::default()).unwrap();

        assert_eq!(imputed.len(), 1);
        assert_eq!(imputed[0].column, "LOW");
        assert_eq!(imputed[0].filled, 1);

        let low = out.column("LOW").unwrap();
        assert_eq!(low.null_count(), 0);
        assert_eq!(low.get(1).unwrap(), AnyValue::String("No especificado"));
        assert_eq!(low.get(2).unwrap(), AnyValue::String("99999"));
        assert_eq!(out.column("HALF").unwrap().null_count(), 2);
        assert_eq!(out.column("NUM").unwrap().null_count(), 1);
    }
}
