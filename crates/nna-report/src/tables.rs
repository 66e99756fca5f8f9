//! Derived tables under `tables/`.
//!
//! Each writer returns the paths it produced so the orchestrator can list
//! them in the run log.

use std::path::PathBuf;

use nna_analysis::{
    CorrelationMatrix, CrossAnalyses, FrequencyTable, LocalityTrend, NumericSummary,
    SpatiotemporalAnalysis,
};
use nna_ingest::ColumnMapping;
use nna_model::{DictionaryEntry, QualityReport};
use nna_quality::missing_ranking;

use crate::delimited::{format_percent, write_table_csv};
use crate::error::Result;
use crate::json::write_json;
use crate::layout::{OutputLayout, file_stem};

pub fn write_column_mapping(layout: &OutputLayout, mapping: &ColumnMapping) -> Result<PathBuf> {
    let path = layout.table("column_mapping.json");
    write_json(&path, mapping)?;
    Ok(path)
}

pub fn write_quality_report(layout: &OutputLayout, report: &QualityReport) -> Result<PathBuf> {
    let path = layout.table("quality_report.json");
    write_json(&path, report)?;
    Ok(path)
}

pub fn write_dictionary(layout: &OutputLayout, entries: &[DictionaryEntry]) -> Result<PathBuf> {
    let path = layout.table("variable_dictionary.csv");
    let rows = entries.iter().map(|entry| {
        vec![
            entry.variable.clone(),
            entry.kind.as_str().to_string(),
            entry.dtype.clone(),
            entry.null_count.to_string(),
            format_percent(entry.null_percentage),
            entry.distinct.to_string(),
            format_percent(entry.cardinality_percentage),
            entry.sample_value.clone().unwrap_or_default(),
            entry.classification.dataset_label().to_string(),
        ]
    });
    write_table_csv(
        &path,
        &[
            "Variable",
            "Kind",
            "Dtype",
            "Null_Count",
            "Null_Percentage",
            "Distinct",
            "Cardinality_Percentage",
            "Sample_Value",
            "Classification",
        ],
        rows,
    )?;
    Ok(path)
}

/// Every column ranked by true-null percentage, with its sentinel share.
pub fn write_missing_report(layout: &OutputLayout, report: &QualityReport) -> Result<PathBuf> {
    let path = layout.table("missing_report.csv");
    let ranking = missing_ranking(report, report.columns.len());
    let rows = ranking.into_iter().map(|(name, nulls)| {
        let (sentinels, effective) = report
            .column(&name)
            .map(|column| (column.sentinel_count(), column.effective_missing.percentage))
            .unwrap_or_default();
        vec![
            name,
            nulls.count.to_string(),
            format_percent(nulls.percentage),
            sentinels.to_string(),
            format_percent(effective),
        ]
    });
    write_table_csv(
        &path,
        &[
            "Column",
            "Null_Count",
            "Null_Percentage",
            "Sentinel_Count",
            "Effective_Missing_Percentage",
        ],
        rows,
    )?;
    Ok(path)
}

fn format_stat(value: f64) -> String {
    format!("{value:.4}")
}

pub fn write_numeric_stats(layout: &OutputLayout, summaries: &[NumericSummary]) -> Result<PathBuf> {
    let path = layout.table("numeric_stats.csv");
    let rows = summaries.iter().map(|s| {
        vec![
            s.column.clone(),
            s.count.to_string(),
            format_stat(s.mean),
            s.std.map(format_stat).unwrap_or_default(),
            format_stat(s.min),
            format_stat(s.q25),
            format_stat(s.median),
            format_stat(s.q75),
            format_stat(s.max),
        ]
    });
    write_table_csv(
        &path,
        &["Column", "Count", "Mean", "Std", "Min", "Q25", "Median", "Q75", "Max"],
        rows,
    )?;
    Ok(path)
}

/// Square matrix with a `Column` label column; undefined coefficients are blank.
pub fn write_correlation_matrix(
    layout: &OutputLayout,
    matrix: &CorrelationMatrix,
) -> Result<Option<PathBuf>> {
    if matrix.is_empty() {
        return Ok(None);
    }
    let path = layout.table("correlation_matrix.csv");
    let mut headers = vec!["Column"];
    headers.extend(matrix.columns.iter().map(String::as_str));
    let rows = matrix
        .columns
        .iter()
        .zip(&matrix.coefficients)
        .map(|(name, coefficients)| {
            let mut row = vec![name.clone()];
            row.extend(
                coefficients
                    .iter()
                    .map(|value| value.map(format_stat).unwrap_or_default()),
            );
            row
        });
    write_table_csv(&path, &headers, rows)?;
    Ok(Some(path))
}

/// One `freq_<COLUMN>.csv` per profiled categorical column.
pub fn write_frequencies(layout: &OutputLayout, tables: &[FrequencyTable]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(tables.len());
    for table in tables {
        let path = layout.table(&format!("freq_{}.csv", file_stem(&table.column)));
        let rows = table
            .values
            .iter()
            .map(|(value, count)| vec![value.clone(), count.to_string()]);
        write_table_csv(&path, &[table.column.as_str(), "Count"], rows)?;
        paths.push(path);
    }
    Ok(paths)
}

fn trend_row(trend: &LocalityTrend) -> Vec<String> {
    vec![
        trend.locality.clone(),
        trend.total.to_string(),
        format_percent(trend.average_per_year),
        trend
            .change_absolute
            .map(|change| change.to_string())
            .unwrap_or_default(),
        trend.change_percent.map(format_percent).unwrap_or_default(),
        trend
            .trend
            .map(|label| label.as_str().to_string())
            .unwrap_or_default(),
    ]
}

const TREND_HEADERS: [&str; 6] = [
    "Locality",
    "Total",
    "Average_Per_Year",
    "Change_Absolute",
    "Change_Percent",
    "Trend",
];

/// Counts, pivot matrix, trends and alert zones.
pub fn write_spatiotemporal(
    layout: &OutputLayout,
    analysis: &SpatiotemporalAnalysis,
) -> Result<Vec<PathBuf>> {
    let counts_path = layout.table("locality_year_counts.csv");
    let rows = analysis.counts.iter().map(|row| {
        vec![
            row.locality.clone(),
            row.year.to_string(),
            row.count.to_string(),
        ]
    });
    write_table_csv(
        &counts_path,
        &[
            analysis.locality_column.as_str(),
            analysis.year_column.as_str(),
            "Count",
        ],
        rows,
    )?;

    let matrix_path = layout.table("locality_year_matrix.csv");
    let matrix = &analysis.matrix;
    let mut headers = vec![analysis.locality_column.clone()];
    headers.extend(matrix.years.iter().map(ToString::to_string));
    headers.push("Total".to_string());
    let rows = matrix.localities.iter().zip(&matrix.cells).map(|(locality, cells)| {
        let mut row = vec![locality.clone()];
        row.extend(cells.iter().map(ToString::to_string));
        row.push(cells.iter().sum::<usize>().to_string());
        row
    });
    write_table_csv(&matrix_path, &headers, rows)?;

    let trends_path = layout.table("locality_trends.csv");
    write_table_csv(&trends_path, &TREND_HEADERS, analysis.trends.iter().map(trend_row))?;

    let alerts_path = layout.table("alert_zones.csv");
    write_table_csv(&alerts_path, &TREND_HEADERS, analysis.alerts.iter().map(trend_row))?;

    Ok(vec![counts_path, matrix_path, trends_path, alerts_path])
}

/// `crosstab_<name>.csv` per analysis plus the health-regime distribution.
pub fn write_crosstabs(layout: &OutputLayout, analyses: &CrossAnalyses) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for named in &analyses.tables {
        let table = &named.table;
        let path = layout.table(&format!("crosstab_{}.csv", file_stem(&named.name)));
        let mut headers = vec![table.row_label.clone()];
        headers.extend(table.columns.iter().cloned());
        let rows: Vec<Vec<String>> = if named.as_percentages {
            table
                .rows
                .iter()
                .zip(table.row_percentages())
                .map(|(label, cells)| {
                    let mut row = vec![label.clone()];
                    row.extend(cells.into_iter().map(format_percent));
                    row
                })
                .collect()
        } else {
            headers.push("Total".to_string());
            table
                .rows
                .iter()
                .zip(&table.counts)
                .map(|(label, cells)| {
                    let mut row = vec![label.clone()];
                    row.extend(cells.iter().map(ToString::to_string));
                    row.push(cells.iter().sum::<usize>().to_string());
                    row
                })
                .collect()
        };
        write_table_csv(&path, &headers, rows)?;
        paths.push(path);
    }

    if let Some(column) = &analyses.health_regime_column {
        let path = layout.table("health_regime_distribution.csv");
        let rows = analyses
            .health_regime_distribution
            .iter()
            .map(|(value, count)| vec![value.clone(), count.to_string()]);
        write_table_csv(&path, &[column.as_str(), "Count"], rows)?;
        paths.push(path);
    }
    Ok(paths)
}
