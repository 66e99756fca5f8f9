//! Contingency tables between key columns.

use std::collections::HashMap;

use polars::prelude::{AnyValue, DataFrame, PolarsResult};
use serde::Serialize;
use tracing::{info, warn};

use nna_common::any_to_string;
use nna_model::discovery::find_column;
use nna_model::ColumnDiscovery;

use crate::exploratory::top_n_frequencies;

/// Exact counts of `(row value, column value)` pairs.
///
/// Row and column labels keep first-encountered order; rows with a null in
/// either column are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub row_label: String,
    pub column_label: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn row_totals(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Each row as percentages of its total; an all-zero row stays zero.
    pub fn row_percentages(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let total: usize = row.iter().sum();
                row.iter()
                    .map(|count| {
                        if total == 0 {
                            0.0
                        } else {
                            *count as f64 / total as f64 * 100.0
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub fn get(&self, row: &str, column: &str) -> Option<usize> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.columns.iter().position(|v| v == column)?;
        Some(self.counts[r][c])
    }
}

fn cell_text(value: PolarsResult<AnyValue<'_>>) -> Option<String> {
    match value {
        Ok(AnyValue::Null) | Err(_) => None,
        Ok(value) => Some(any_to_string(value)),
    }
}

pub fn crosstab(df: &DataFrame, row_column: &str, column_column: &str) -> PolarsResult<CrossTab> {
    let left = df.column(row_column)?;
    let right = df.column(column_column)?;

    let mut table = CrossTab {
        row_label: row_column.to_string(),
        column_label: column_column.to_string(),
        ..CrossTab::default()
    };
    let mut row_index: HashMap<String, usize> = HashMap::new();
    let mut column_index: HashMap<String, usize> = HashMap::new();

    for idx in 0..df.height() {
        let (Some(row), Some(column)) = (cell_text(left.get(idx)), cell_text(right.get(idx)))
        else {
            continue;
        };
        let r = *row_index.entry(row.clone()).or_insert_with(|| {
            table.rows.push(row);
            table.counts.push(vec![0; table.columns.len()]);
            table.rows.len() - 1
        });
        let c = *column_index.entry(column.clone()).or_insert_with(|| {
            table.columns.push(column);
            for counts in &mut table.counts {
                counts.push(0);
            }
            table.columns.len() - 1
        });
        table.counts[r][c] += 1;
    }
    Ok(table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCrossTab {
    /// File-safe name of the analysis.
    pub name: String,
    pub table: CrossTab,
    /// Write row percentages instead of counts.
    pub as_percentages: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossAnalyses {
    pub tables: Vec<NamedCrossTab>,
    pub health_regime_column: Option<String>,
    /// Full value counts of the health-regime column.
    pub health_regime_distribution: Vec<(String, usize)>,
    /// Analyses that could not run, with the reason.
    pub skipped: Vec<String>,
}

/// Crosstabs between the discovered locality, year, intervention type,
/// health regime, reason and service columns.
pub fn cross_analyses(
    df: &DataFrame,
    discovery: &ColumnDiscovery,
    year_column: Option<&str>,
) -> PolarsResult<CrossAnalyses> {
    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let names = || column_names.iter().map(String::as_str);
    let locality = discovery.locality_column(names());
    let intervention = discovery.intervention_type_column(names());
    let regime = discovery.health_regime_column(names());
    let reason = find_column(&discovery.reason, names());
    let service = find_column(&discovery.service, names());
    let year = year_column
        .filter(|name| df.column(name).is_ok())
        .map(str::to_string);

    let mut analyses = CrossAnalyses::default();
    let pairs = [
        ("locality_intervention_type", &locality, &intervention, false),
        ("year_intervention_type", &year, &intervention, false),
        ("reason_service", &reason, &service, false),
        ("locality_health_regime", &locality, &regime, true),
    ];
    for (name, rows, columns, as_percentages) in pairs {
        match (rows, columns) {
            (Some(rows), Some(columns)) => analyses.tables.push(NamedCrossTab {
                name: name.to_string(),
                table: crosstab(df, rows, columns)?,
                as_percentages,
            }),
            _ => {
                warn!(analysis = name, "insufficient columns for crosstab");
                analyses.skipped.push(format!("{name}: insufficient columns"));
            }
        }
    }

    if let Some(regime) = &regime {
        let column = df.column(regime)?;
        analyses.health_regime_distribution = top_n_frequencies(column, usize::MAX);
        analyses.health_regime_column = Some(regime.clone());
    } else {
        analyses.skipped.push("health_regime: insufficient columns".to_string());
    }

    info!(
        tables = analyses.tables.len(),
        skipped = analyses.skipped.len(),
        "cross analyses"
    );
    Ok(analyses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, df};

    #[test]
    fn counts_in_first_seen_order() {
        let df = df! {
            "LOCALIDAD" => &[Some("Suba"), Some("Bosa"), Some("Suba"), None, Some("Bosa")],
            "TIPO" => &[Some("Visita"), Some("Taller"), Some("Visita"), Some("Taller"), Some("Visita")],
        }
        .unwrap();
        let table = crosstab(&df, "LOCALIDAD", "TIPO").unwrap();
        assert_eq!(table.rows, vec!["Suba", "Bosa"]);
        assert_eq!(table.columns, vec!["Visita", "Taller"]);
        assert_eq!(table.counts, vec![vec![2, 0], vec![1, 1]]);
        assert_eq!(table.row_totals(), vec![2, 2]);
        assert_eq!(table.row_percentages()[1], vec![50.0, 50.0]);
        assert_eq!(table.get("Suba", "Taller"), Some(0));
    }

    #[test]
    fn missing_columns_are_skipped() {
        let df = df! {
            "LOCALIDAD" => &["Suba", "Bosa"],
            "REGIMEN_AFILIACION" => &["Subsidiado", "Contributivo"],
        }
        .unwrap();
        let analyses = cross_analyses(&df, &ColumnDiscovery::default(), None).unwrap();
        assert_eq!(analyses.tables.len(), 1);
        assert_eq!(analyses.tables[0].name, "locality_health_regime");
        assert!(analyses.tables[0].as_percentages);
        assert_eq!(analyses.skipped.len(), 3);
        assert_eq!(analyses.health_regime_distribution.len(), 2);
    }
}
