//! Pearson correlation between numeric columns.

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::debug;

use nna_model::SentinelRegistry;
use nna_quality::float_values;

/// Square, symmetric matrix over `columns`.
///
/// A coefficient is `None` when the pair has fewer than two rows where both
/// sides hold a real value, or when either side is constant over those rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub coefficients: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, first: &str, second: &str) -> Option<f64> {
        let row = self.columns.iter().position(|name| name == first)?;
        let col = self.columns.iter().position(|name| name == second)?;
        self.coefficients[row][col]
    }
}

/// Pearson coefficient over the rows where both values are present.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Pairwise-complete correlation of `columns`, sentinels and nulls excluded.
///
/// Names missing from `df` are skipped.
pub fn correlation_matrix(
    df: &DataFrame,
    columns: &[String],
    registry: &SentinelRegistry,
) -> CorrelationMatrix {
    let mut names = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());
    for name in columns {
        let Ok(column) = df.column(name) else {
            debug!(column = %name, "correlation column no longer present");
            continue;
        };
        names.push(name.clone());
        values.push(float_values(column, registry));
    }

    let size = names.len();
    let mut coefficients = vec![vec![None; size]; size];
    for row in 0..size {
        for col in row..size {
            let coefficient = pearson(&values[row], &values[col]);
            // a column against itself is exactly 1 whenever it varies
            let coefficient = if row == col {
                coefficient.map(|_| 1.0)
            } else {
                coefficient
            };
            coefficients[row][col] = coefficient;
            coefficients[col][row] = coefficient;
        }
    }
    CorrelationMatrix {
        columns: names,
        coefficients,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, df};

    #[test]
    fn perfect_and_inverse_relations() {
        let df = df! {
            "A" => &[1i64, 2, 3, 4],
            "B" => &[2.0f64, 4.0, 6.0, 8.0],
            "C" => &[4i64, 3, 2, 1],
        }
        .unwrap();
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let matrix = correlation_matrix(&df, &names, &SentinelRegistry::default());

        assert_eq!(matrix.get("A", "A"), Some(1.0));
        assert!((matrix.get("A", "B").unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.get("A", "C").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("C", "A"), matrix.get("A", "C"));
    }

    #[test]
    fn sentinels_and_nulls_are_pairwise_excluded() {
        let df = df! {
            "EDAD" => &[Some(1i64), Some(2), Some(99999), Some(3), None],
            "PESO" => &[Some(10.0f64), Some(20.0), Some(-500.0), Some(30.0), Some(7.0)],
        }
        .unwrap();
        let names = vec!["EDAD".to_string(), "PESO".to_string()];
        let matrix = correlation_matrix(&df, &names, &SentinelRegistry::default());
        assert!((matrix.get("EDAD", "PESO").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_or_sparse_pairs_have_no_coefficient() {
        assert_eq!(pearson(&[Some(1.0), Some(1.0)], &[Some(1.0), Some(2.0)]), None);
        assert_eq!(pearson(&[Some(1.0), None], &[Some(1.0), Some(2.0)]), None);

        let df = df! { "K" => &[5i64, 5, 5] }.unwrap();
        let matrix =
            correlation_matrix(&df, &["K".to_string(), "GONE".to_string()], &SentinelRegistry::default());
        assert_eq!(matrix.columns, vec!["K"]);
        assert_eq!(matrix.get("K", "K"), None);
    }
}
