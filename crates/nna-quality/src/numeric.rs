//! Sentinel-aware numeric coercion.
//!
//! Real-value statistics and year grouping read numbers through these
//! helpers so that a registered code never poses as a measurement.

use polars::prelude::{AnyValue, Column};

use nna_common::{any_to_f64, any_to_i64};
use nna_model::SentinelRegistry;

/// Integer value of a cell; sentinels, nulls and unparseable text give `None`.
pub fn coerce_i64(value: AnyValue<'_>, registry: &SentinelRegistry) -> Option<i64> {
    if registry.is_any_sentinel(&value) {
        return None;
    }
    any_to_i64(value)
}

/// Float value of a cell; sentinels, nulls and unparseable text give `None`.
pub fn coerce_f64(value: AnyValue<'_>, registry: &SentinelRegistry) -> Option<f64> {
    if registry.is_any_sentinel(&value) {
        return None;
    }
    any_to_f64(value)
}

/// Row-aligned integer view of a column.
pub fn integer_values(column: &Column, registry: &SentinelRegistry) -> Vec<Option<i64>> {
    (0..column.len())
        .map(|idx| {
            column
                .get(idx)
                .ok()
                .and_then(|value| coerce_i64(value, registry))
        })
        .collect()
}

/// Row-aligned float view of a column.
pub fn float_values(column: &Column, registry: &SentinelRegistry) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|idx| {
            column
                .get(idx)
                .ok()
                .and_then(|value| coerce_f64(value, registry))
        })
        .collect()
}

/// Real numbers of a column, sentinels and nulls skipped.
pub fn real_values(column: &Column, registry: &SentinelRegistry) -> Vec<f64> {
    (0..column.len())
        .filter_map(|idx| {
            column
                .get(idx)
                .ok()
                .and_then(|value| coerce_f64(value, registry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{DataFrame, NamedFrom, df};

    fn years() -> DataFrame {
        df! {
            "ANO" => &[Some("2021"), Some("99999"), Some("abc"), None, Some("2022.0")],
        }
        .unwrap()
    }

    #[test]
    fn integer_view_skips_sentinels() {
        let df = years();
        let values = integer_values(df.column("ANO").unwrap(), &SentinelRegistry::default());
        assert_eq!(values, vec![Some(2021), None, None, None, Some(2022)]);
    }

    #[test]
    fn real_values_skip_sentinels_and_nulls() {
        let df = df! {
            "PESO" => &[Some(99999.0f64), Some(1.5), None, Some(2.5)],
        }
        .unwrap();
        let values = real_values(df.column("PESO").unwrap(), &SentinelRegistry::default());
        assert_eq!(values, vec![1.5, 2.5]);
    }
}
