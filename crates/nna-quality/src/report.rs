//! Quality report and variable dictionary assembly.

use polars::prelude::{DataFrame, PolarsResult};
use tracing::{debug, info};

use nna_model::{
    ColumnQuality, DictionaryEntry, NullStat, ProblemColumn, ProblemFlag, QualityReport,
    QualityThresholds, SentinelRegistry,
};

use crate::classify::{classify_profile, flags_for_profile};
use crate::duplicates::duplicate_count;
use crate::missingness::{effective_missing, sentinel_stats};
use crate::profile::profile_table;

/// Audits the table as it currently stands.
pub fn build_quality_report(
    df: &DataFrame,
    registry: &SentinelRegistry,
    thresholds: &QualityThresholds,
    memory_bytes: usize,
) -> PolarsResult<QualityReport> {
    let rows = df.height();
    let profiles = profile_table(df);
    let sentinels = sentinel_stats(df, registry);
    let effective = effective_missing(df, registry)?;
    let duplicates = duplicate_count(df);

    let mut columns = Vec::with_capacity(profiles.len());
    let mut problem_columns = Vec::new();
    for (profile, (_, effective)) in profiles.iter().zip(effective) {
        let flags = flags_for_profile(profile, thresholds);
        let column_sentinels = sentinels
            .iter()
            .find(|entry| entry.column == profile.name)
            .map(|entry| entry.stats.clone())
            .unwrap_or_default();
        columns.push(ColumnQuality {
            name: profile.name.clone(),
            kind: profile.kind,
            nulls: profile.nulls,
            sentinels: column_sentinels,
            effective_missing: effective,
            distinct: profile.distinct,
            constant: flags.contains(&ProblemFlag::Constant),
            near_empty: flags.contains(&ProblemFlag::NearEmpty),
            high_cardinality: flags.contains(&ProblemFlag::HighCardinality),
        });
        if !flags.is_empty() {
            problem_columns.push(ProblemColumn {
                column: profile.name.clone(),
                problems: flags,
            });
        }
    }

    let average_null_percentage = if columns.is_empty() {
        0.0
    } else {
        columns.iter().map(|c| c.nulls.percentage).sum::<f64>() / columns.len() as f64
    };

    let report = QualityReport {
        total_rows: rows,
        total_columns: df.width(),
        duplicate_rows: duplicates,
        duplicate_percentage: NullStat::new(duplicates, rows).percentage,
        average_null_percentage,
        constant_columns: columns.iter().filter(|c| c.constant).count(),
        near_empty_columns: columns.iter().filter(|c| c.near_empty).count(),
        memory_mb: memory_bytes as f64 / (1024.0 * 1024.0),
        columns,
        problem_columns,
    };
    info!(
        rows = report.total_rows,
        columns = report.total_columns,
        duplicates = report.duplicate_rows,
        sentinels = report.total_sentinels(),
        problems = report.problem_columns.len(),
        avg_null_pct = format_args!("{:.2}", report.average_null_percentage),
        "quality audit"
    );
    Ok(report)
}

/// One dictionary row per column, labels from the current state.
pub fn build_dictionary(df: &DataFrame, thresholds: &QualityThresholds) -> Vec<DictionaryEntry> {
    let entries: Vec<DictionaryEntry> = profile_table(df)
        .into_iter()
        .map(|profile| {
            let classification = classify_profile(&profile, thresholds);
            DictionaryEntry {
                cardinality_percentage: profile.cardinality_percentage(),
                variable: profile.name,
                kind: profile.kind,
                dtype: profile.dtype,
                null_count: profile.nulls.count,
                null_percentage: profile.nulls.percentage,
                distinct: profile.distinct,
                sample_value: profile.sample,
                classification,
            }
        })
        .collect();
    debug!(entries = entries.len(), "built variable dictionary");
    entries
}

/// Columns by true-null percentage, highest first; ties keep table order.
pub fn missing_ranking(report: &QualityReport, limit: usize) -> Vec<(String, NullStat)> {
    let mut ranked: Vec<(String, NullStat)> = report
        .columns
        .iter()
        .map(|column| (column.name.clone(), column.nulls))
        .collect();
    ranked.sort_by(|a, b| b.1.percentage.total_cmp(&a.1.percentage));
    ranked.truncate(limit);
    ranked
}
