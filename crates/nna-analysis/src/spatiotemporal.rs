//! Locality by year counts, trends, and alert zones.
//!
//! Years are read through the sentinel-aware integer coercion and must lie
//! in the configured range; anything else is discarded, never clamped.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{AnyValue, DataFrame, PolarsResult};
use serde::Serialize;
use tracing::{info, warn};

use nna_common::any_to_string;
use nna_model::{SentinelRegistry, SpatiotemporalOptions};
use nna_quality::integer_values;

/// Direction and strength of change between the first and last year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongIncrease,
    ModerateIncrease,
    Stable,
    ModerateDecrease,
    StrongDecrease,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongIncrease => "strong increase",
            Self::ModerateIncrease => "moderate increase",
            Self::Stable => "stable",
            Self::ModerateDecrease => "moderate decrease",
            Self::StrongDecrease => "strong decrease",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalityYearCount {
    pub locality: String,
    pub year: i64,
    pub count: usize,
}

/// Dense locality × year count matrix; absent combinations are 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalityYearMatrix {
    pub localities: Vec<String>,
    pub years: Vec<i64>,
    pub cells: Vec<Vec<usize>>,
}

impl LocalityYearMatrix {
    pub fn get(&self, locality: &str, year: i64) -> Option<usize> {
        let row = self.localities.iter().position(|l| l == locality)?;
        let col = self.years.iter().position(|y| *y == year)?;
        Some(self.cells[row][col])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalityTrend {
    pub locality: String,
    pub total: usize,
    pub average_per_year: f64,
    /// Present only with at least two valid years.
    pub change_absolute: Option<i64>,
    pub change_percent: Option<f64>,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatiotemporalAnalysis {
    pub locality_column: String,
    pub year_column: String,
    /// Rows without a locality or a valid year.
    pub discarded_rows: usize,
    pub counts: Vec<LocalityYearCount>,
    pub matrix: LocalityYearMatrix,
    pub trends: Vec<LocalityTrend>,
    /// Localities whose absolute change exceeds the alert threshold,
    /// highest change first.
    pub alerts: Vec<LocalityTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpatiotemporalOutcome {
    Complete(SpatiotemporalAnalysis),
    Insufficient { reason: String },
}

/// `(last - first) / (first + 1) * 100`, rounded to two decimals.
pub fn change_percent(first: usize, last: usize) -> f64 {
    let raw = (last as f64 - first as f64) / (first as f64 + 1.0) * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Half-open bands: `> strong` strong increase, `(moderate, strong]`
/// moderate increase, `[-moderate, moderate]` stable, `[-strong, -moderate)`
/// moderate decrease, `< -strong` strong decrease.
pub fn classify_trend(change_percent: f64, options: &SpatiotemporalOptions) -> Trend {
    let strong = options.strong_change;
    let moderate = options.moderate_change;
    if change_percent > strong {
        Trend::StrongIncrease
    } else if change_percent > moderate {
        Trend::ModerateIncrease
    } else if change_percent >= -moderate {
        Trend::Stable
    } else if change_percent >= -strong {
        Trend::ModerateDecrease
    } else {
        Trend::StrongDecrease
    }
}

/// Exact `(locality, year)` counts, ordered by locality then year.
///
/// Returns the counts and the number of discarded rows.
pub fn group_counts(
    df: &DataFrame,
    locality_column: &str,
    year_column: &str,
    registry: &SentinelRegistry,
    options: &SpatiotemporalOptions,
) -> PolarsResult<(Vec<LocalityYearCount>, usize)> {
    let localities = df.column(locality_column)?;
    let years = integer_values(df.column(year_column)?, registry);
    let valid = options.valid_years();

    let mut grouped: BTreeMap<(String, i64), usize> = BTreeMap::new();
    let mut discarded = 0usize;
    for (idx, year) in years.into_iter().enumerate() {
        let locality = match localities.get(idx) {
            Ok(AnyValue::Null) | Err(_) => None,
            Ok(value) => Some(any_to_string(value).trim().to_string()),
        };
        match (locality, year) {
            (Some(locality), Some(year)) if !locality.is_empty() && valid.contains(&year) => {
                *grouped.entry((locality, year)).or_default() += 1;
            }
            _ => discarded += 1,
        }
    }

    let counts = grouped
        .into_iter()
        .map(|((locality, year), count)| LocalityYearCount {
            locality,
            year,
            count,
        })
        .collect();
    Ok((counts, discarded))
}

/// Pivots counts into a matrix over every locality and year that occurs.
pub fn pivot(rows: &[LocalityYearCount]) -> LocalityYearMatrix {
    let localities: Vec<String> = rows
        .iter()
        .map(|row| row.locality.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let years: Vec<i64> = rows
        .iter()
        .map(|row| row.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut cells = vec![vec![0usize; years.len()]; localities.len()];
    for row in rows {
        let r = localities.iter().position(|l| *l == row.locality);
        let c = years.iter().position(|y| *y == row.year);
        if let (Some(r), Some(c)) = (r, c) {
            cells[r][c] += row.count;
        }
    }
    LocalityYearMatrix {
        localities,
        years,
        cells,
    }
}

fn locality_trends(matrix: &LocalityYearMatrix, options: &SpatiotemporalOptions) -> Vec<LocalityTrend> {
    let year_count = matrix.years.len();
    matrix
        .localities
        .iter()
        .zip(&matrix.cells)
        .map(|(locality, row)| {
            let total: usize = row.iter().sum();
            let average_per_year = if year_count == 0 {
                0.0
            } else {
                total as f64 / year_count as f64
            };
            let (change_absolute, change, trend) = if year_count >= 2 {
                let first = row[0];
                let last = row[year_count - 1];
                let change = change_percent(first, last);
                (
                    Some(last as i64 - first as i64),
                    Some(change),
                    Some(classify_trend(change, options)),
                )
            } else {
                (None, None, None)
            };
            LocalityTrend {
                locality: locality.clone(),
                total,
                average_per_year,
                change_absolute,
                change_percent: change,
                trend,
            }
        })
        .collect()
}

/// Full locality × year analysis, or `Insufficient` when a required column
/// is missing.
pub fn analyze_spatiotemporal(
    df: &DataFrame,
    locality_column: Option<&str>,
    year_column: Option<&str>,
    registry: &SentinelRegistry,
    options: &SpatiotemporalOptions,
) -> PolarsResult<SpatiotemporalOutcome> {
    let (locality_column, year_column) = match (locality_column, year_column) {
        (Some(locality), Some(year))
            if df.column(locality).is_ok() && df.column(year).is_ok() =>
        {
            (locality, year)
        }
        (locality, year) => {
            let reason = format!(
                "insufficient columns: locality={}, year={}",
                locality.unwrap_or("missing"),
                year.unwrap_or("missing")
            );
            warn!(%reason, "spatiotemporal analysis skipped");
            return Ok(SpatiotemporalOutcome::Insufficient { reason });
        }
    };

    let (counts, discarded_rows) =
        group_counts(df, locality_column, year_column, registry, options)?;
    let matrix = pivot(&counts);
    let trends = locality_trends(&matrix, options);

    let mut alerts: Vec<LocalityTrend> = trends
        .iter()
        .filter(|t| {
            t.change_percent
                .is_some_and(|change| change.abs() > options.alert_threshold)
        })
        .cloned()
        .collect();
    alerts.sort_by(|a, b| {
        let a = a.change_percent.unwrap_or_default();
        let b = b.change_percent.unwrap_or_default();
        b.total_cmp(&a)
    });

    info!(
        localities = matrix.localities.len(),
        years = ?matrix.years,
        discarded = discarded_rows,
        alerts = alerts.len(),
        "spatiotemporal analysis"
    );

    Ok(SpatiotemporalOutcome::Complete(SpatiotemporalAnalysis {
        locality_column: locality_column.to_string(),
        year_column: year_column.to_string(),
        discarded_rows,
        counts,
        matrix,
        trends,
        alerts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_bands_are_half_open() {
        let options = SpatiotemporalOptions::default();
        assert_eq!(classify_trend(20.0, &options), Trend::ModerateIncrease);
        assert_eq!(classify_trend(20.01, &options), Trend::StrongIncrease);
        assert_eq!(classify_trend(5.0, &options), Trend::Stable);
        assert_eq!(classify_trend(5.01, &options), Trend::ModerateIncrease);
        assert_eq!(classify_trend(-5.0, &options), Trend::Stable);
        assert_eq!(classify_trend(-5.01, &options), Trend::ModerateDecrease);
        assert_eq!(classify_trend(-20.0, &options), Trend::ModerateDecrease);
        assert_eq!(classify_trend(-20.01, &options), Trend::StrongDecrease);
    }

    #[test]
    fn change_percent_rounds_to_two_decimals() {
        assert_eq!(change_percent(10, 8), -18.18);
        assert_eq!(change_percent(5, 12), 116.67);
        assert_eq!(change_percent(0, 0), 0.0);
        assert_eq!(change_percent(0, 3), 300.0);
    }

    #[test]
    fn pivot_fills_missing_combinations() {
        let rows = vec![
            LocalityYearCount {
                locality: "A".to_string(),
                year: 2021,
                count: 3,
            },
            LocalityYearCount {
                locality: "B".to_string(),
                year: 2022,
                count: 1,
            },
        ];
        let matrix = pivot(&rows);
        assert_eq!(matrix.years, vec![2021, 2022]);
        assert_eq!(matrix.get("A", 2022), Some(0));
        assert_eq!(matrix.get("B", 2022), Some(1));
        assert_eq!(matrix.get("C", 2022), None);
    }
}
