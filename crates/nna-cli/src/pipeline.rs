//! Batch pipeline with explicit stages.
//!
//! Stages run in a fixed order:
//! 1. **Load**: read the input table
//! 2. **Normalize**: canonical column names, collisions surfaced
//! 3. **PII**: drop personal columns, hash identifiers
//! 4. **Temporal**: date conversion and year column
//! 5. **Audit**: quality report and classification of the uncleaned table
//! 6. **Clean**: text cleanup and deduplication
//! 7. **Impute** / **Standardize**: categorical repairs
//! 8. **Re-audit**: quality report of the cleaned table
//! 9. **Exploratory**, **Spatiotemporal**, **Crosstabs**: aggregations
//! 10. **Export**: cleaned table, tables, summary
//!
//! Each stage takes an immutable frame and returns a new one. Configuration
//! and input errors end the run with an error; a failure inside any later
//! stage is recorded, the remaining stages are skipped, and the run log is
//! still written.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use polars::prelude::DataFrame;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use nna_analysis::{
    CrossAnalyses, ExploratoryProfile, SpatiotemporalOutcome, analyze_spatiotemporal,
    cross_analyses, exploratory_profile,
};
use nna_ingest::{
    ColumnMapping, IngestError, LoadedTable, PiiReport, load_table, normalize_columns_from,
    strip_pii,
};
use nna_model::{PipelineConfig, QualityReport, VariableClass};
use nna_quality::{build_dictionary, build_quality_report, classify, drop_duplicates};
use nna_report::{OutputLayout, ReportInputs, WrittenReports, write_reports};
use nna_transform::{
    ImputedColumn, StandardizedColumn, TemporalInfo, TextCleanup, clean_text,
    detect_temporal_columns, impute_categorical, standardize_categories,
};

use crate::config::ConfigError;
use crate::run_log::{LogLevel, RunLog, RunLogGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Normalize,
    Pii,
    Temporal,
    Audit,
    Clean,
    Impute,
    Standardize,
    Reaudit,
    Exploratory,
    Spatiotemporal,
    Crosstabs,
    Export,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Normalize => "normalize",
            Self::Pii => "pii",
            Self::Temporal => "temporal",
            Self::Audit => "audit",
            Self::Clean => "clean",
            Self::Impute => "impute",
            Self::Standardize => "standardize",
            Self::Reaudit => "reaudit",
            Self::Exploratory => "exploratory",
            Self::Spatiotemporal => "spatiotemporal",
            Self::Crosstabs => "crosstabs",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("input error: {0}")]
    Input(#[source] IngestError),

    #[error("stage {stage} failed: {source:#}")]
    Stage {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Configuration and input errors end the process with a failure code.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Stage { .. })
    }
}

trait StageResultExt<T> {
    fn in_stage(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T, E> StageResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn in_stage(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|error| PipelineError::Stage {
            stage,
            source: anyhow::Error::new(error),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Aborted { stage: Stage, error: String },
}

/// Everything a run produced, filled in stage by stage.
///
/// After an aborted run the fields of the stages that did not run stay
/// empty.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub status: RunStatus,
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub rows_loaded: usize,
    pub columns_loaded: usize,
    pub sheet: Option<String>,
    pub mapping: ColumnMapping,
    pub pii: PiiReport,
    pub temporal: TemporalInfo,
    pub quality: Option<QualityReport>,
    pub labels: Vec<(String, VariableClass)>,
    pub text_cleanup: TextCleanup,
    pub duplicates_removed: usize,
    pub imputed: Vec<ImputedColumn>,
    pub standardized: Vec<StandardizedColumn>,
    pub final_quality: Option<QualityReport>,
    pub exploratory: Option<ExploratoryProfile>,
    pub spatiotemporal: Option<SpatiotemporalOutcome>,
    pub crosstabs: Option<CrossAnalyses>,
    pub cleaned: Option<DataFrame>,
    pub written: Option<WrittenReports>,
    pub warnings: usize,
}

impl PipelineOutcome {
    fn new(config: &PipelineConfig) -> Self {
        Self {
            status: RunStatus::Completed,
            source: config.input_path.clone(),
            output_dir: config.output_dir.clone(),
            rows_loaded: 0,
            columns_loaded: 0,
            sheet: None,
            mapping: ColumnMapping::default(),
            pii: PiiReport::default(),
            temporal: TemporalInfo::default(),
            quality: None,
            labels: Vec::new(),
            text_cleanup: TextCleanup::default(),
            duplicates_removed: 0,
            imputed: Vec::new(),
            standardized: Vec::new(),
            final_quality: None,
            exploratory: None,
            spatiotemporal: None,
            crosstabs: None,
            cleaned: None,
            written: None,
            warnings: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Number of columns per classification label.
    pub fn label_tally(&self) -> BTreeMap<VariableClass, usize> {
        let mut tally = BTreeMap::new();
        for (_, label) in &self.labels {
            *tally.entry(*label).or_insert(0) += 1;
        }
        tally
    }

    pub fn run_log_path(&self) -> PathBuf {
        self.output_dir.join("run_log.txt")
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Runs every stage for `config`; `notes` from configuration resolution
/// open the run log.
pub fn run_pipeline(
    config: &PipelineConfig,
    notes: &[String],
) -> Result<PipelineOutcome, PipelineError> {
    let span = info_span!("pipeline", input = %config.input_path.display());
    let _guard = span.enter();
    let start = Instant::now();

    let mut run_log = RunLogGuard::new(&config.output_dir);
    for note in notes {
        run_log.log_mut().info("config", note.clone());
    }

    let mut outcome = PipelineOutcome::new(config);
    let result = run_stages(config, run_log.log_mut(), &mut outcome);
    match result {
        Ok(()) => {
            run_log.log_mut().info(
                "pipeline",
                format!("completed in {:.2}s", start.elapsed().as_secs_f64()),
            );
        }
        Err(PipelineError::Stage { stage, source }) => {
            let message = format!("{source:#}");
            warn!(%stage, error = %message, "stage failed, remaining stages skipped");
            run_log
                .log_mut()
                .error(stage.as_str(), format!("{message}; remaining stages skipped"));
            outcome.status = RunStatus::Aborted {
                stage,
                error: message,
            };
        }
        Err(error) => {
            run_log.log_mut().error("pipeline", error.to_string());
            return Err(error);
        }
    }
    outcome.warnings = run_log.log().count(LogLevel::Warn);
    info!(
        status = ?outcome.status,
        warnings = outcome.warnings,
        duration_ms = start.elapsed().as_millis(),
        "pipeline finished"
    );
    Ok(outcome)
}

fn run_stages(
    config: &PipelineConfig,
    log: &mut RunLog,
    outcome: &mut PipelineOutcome,
) -> Result<(), PipelineError> {
    let registry = &config.sentinels;
    let thresholds = &config.quality;

    // Stage 1: load
    let loaded = load(config, log)?;
    outcome.rows_loaded = loaded.frame.height();
    outcome.columns_loaded = loaded.frame.width();
    outcome.sheet = loaded.sheet.clone();

    // Stage 2: normalize
    let (df, mapping) = info_span!("normalize")
        .in_scope(|| normalize_columns_from(&loaded.frame, &loaded.source_headers))
        .in_stage(Stage::Normalize)?;
    log.info(
        Stage::Normalize.as_str(),
        format!("{} column names changed", mapping.changes.len()),
    );
    for collision in &mapping.collisions {
        log.warn(
            Stage::Normalize.as_str(),
            format!(
                "'{}' and '{}' both normalize to {}; second renamed to {}",
                collision.first, collision.second, collision.normalized, collision.resolved_as
            ),
        );
    }
    outcome.mapping = mapping;

    // Stage 3: PII
    let (df, pii) = info_span!("pii")
        .in_scope(|| strip_pii(&df, &config.pii))
        .in_stage(Stage::Pii)?;
    if !config.pii.enabled {
        log.info(Stage::Pii.as_str(), "disabled");
    } else {
        log.info(
            Stage::Pii.as_str(),
            format!("dropped {} columns: {}", pii.dropped.len(), pii.dropped.join(", ")),
        );
        if !pii.hashed.is_empty() {
            log.info(
                Stage::Pii.as_str(),
                format!("hashed identifiers: {}", pii.hashed.join(", ")),
            );
        }
    }
    outcome.pii = pii;

    // Stage 4: temporal
    let (df, temporal) = info_span!("temporal")
        .in_scope(|| detect_temporal_columns(&df, &config.discovery, registry))
        .in_stage(Stage::Temporal)?;
    record_temporal(log, &temporal);
    outcome.temporal = temporal;

    // Stage 5: audit of the uncleaned table
    let audit_span = info_span!("audit");
    let (quality, labels, dictionary) = audit_span.in_scope(|| {
        let quality = build_quality_report(&df, registry, thresholds, loaded.memory_bytes)?;
        Ok::<_, polars::prelude::PolarsError>((
            quality,
            classify(&df, thresholds),
            build_dictionary(&df, thresholds),
        ))
    })
    .in_stage(Stage::Audit)?;
    record_audit(log, &quality);
    outcome.labels = labels;
    let tally: Vec<String> = outcome
        .label_tally()
        .iter()
        .map(|(label, count)| format!("{}={count}", label.dataset_label()))
        .collect();
    log.info(
        Stage::Audit.as_str(),
        format!("classification: {}", tally.join(", ")),
    );
    outcome.quality = Some(quality.clone());

    // Stage 6: text cleanup and duplicates
    let (df, cleanup) = info_span!("clean")
        .in_scope(|| clean_text(&df))
        .in_stage(Stage::Clean)?;
    log.info(
        Stage::Clean.as_str(),
        format!(
            "{} text columns: {} cells nulled, {} re-spaced",
            cleanup.columns, cleanup.nulled, cleanup.trimmed
        ),
    );
    outcome.text_cleanup = cleanup;
    let df = if config.cleaning.drop_duplicates {
        let (deduped, removed) = drop_duplicates(&df).in_stage(Stage::Clean)?;
        log.info(
            Stage::Clean.as_str(),
            format!("{removed} duplicate rows removed"),
        );
        outcome.duplicates_removed = removed;
        deduped
    } else {
        df
    };

    // Stage 7: imputation and standardization
    let (df, imputed) = info_span!("impute")
        .in_scope(|| impute_categorical(&df, &config.cleaning))
        .in_stage(Stage::Impute)?;
    for column in &imputed {
        log.info(
            Stage::Impute.as_str(),
            format!(
                "{}: {} nulls filled with '{}' ({:.2}% null)",
                column.column, column.filled, config.cleaning.placeholder, column.null_percentage
            ),
        );
    }
    outcome.imputed = imputed;

    let (df, standardized) = info_span!("standardize")
        .in_scope(|| standardize_categories(&df, &config.cleaning, registry))
        .in_stage(Stage::Standardize)?;
    for column in &standardized {
        log.info(
            Stage::Standardize.as_str(),
            format!("{}: {} values standardized", column.column, column.replaced),
        );
    }
    outcome.standardized = standardized;

    // Stage 8: re-audit
    let final_quality = info_span!("reaudit")
        .in_scope(|| build_quality_report(&df, registry, thresholds, df.estimated_size()))
        .in_stage(Stage::Reaudit)?;
    log.info(
        Stage::Reaudit.as_str(),
        format!(
            "{} rows x {} columns, average null {:.2}%, {} sentinel cells",
            final_quality.total_rows,
            final_quality.total_columns,
            final_quality.average_null_percentage,
            final_quality.total_sentinels()
        ),
    );
    outcome.final_quality = Some(final_quality.clone());

    // Stage 9: aggregations
    let exploratory = info_span!("exploratory").in_scope(|| {
        exploratory_profile(&df, &outcome.labels, registry, &config.profiling)
    });
    log.info(
        Stage::Exploratory.as_str(),
        format!(
            "{} frequency tables ({} categorical), {} numeric summaries",
            exploratory.frequencies.len(),
            exploratory.categorical_total,
            exploratory.numeric.len()
        ),
    );
    outcome.exploratory = Some(exploratory.clone());

    let names = column_names(&df);
    let locality = config
        .discovery
        .locality_column(names.iter().map(String::as_str));
    let year = outcome
        .temporal
        .year_column
        .clone()
        .filter(|name| names.contains(name))
        .or_else(|| config.discovery.year_column(names.iter().map(String::as_str)));
    let spatiotemporal = info_span!("spatiotemporal")
        .in_scope(|| {
            analyze_spatiotemporal(
                &df,
                locality.as_deref(),
                year.as_deref(),
                registry,
                &config.spatiotemporal,
            )
        })
        .in_stage(Stage::Spatiotemporal)?;
    record_spatiotemporal(log, &spatiotemporal);
    outcome.spatiotemporal = Some(spatiotemporal.clone());

    let crosstabs = info_span!("crosstabs")
        .in_scope(|| cross_analyses(&df, &config.discovery, year.as_deref()))
        .in_stage(Stage::Crosstabs)?;
    log.info(
        Stage::Crosstabs.as_str(),
        format!("{} crosstabs", crosstabs.tables.len()),
    );
    for skipped in &crosstabs.skipped {
        log.warn(Stage::Crosstabs.as_str(), skipped.clone());
    }
    outcome.crosstabs = Some(crosstabs.clone());

    // Stage 10: export
    let layout = OutputLayout::new(&config.output_dir);
    let inputs = ReportInputs {
        source: &config.input_path,
        cleaned: &df,
        mapping: &outcome.mapping,
        pii: &outcome.pii,
        temporal: &outcome.temporal,
        quality: &quality,
        final_quality: &final_quality,
        dictionary: &dictionary,
        exploratory: &exploratory,
        spatiotemporal: &spatiotemporal,
        crosstabs: &crosstabs,
    };
    let written = write_reports(&layout, &inputs).in_stage(Stage::Export)?;
    log.info(
        Stage::Export.as_str(),
        format!(
            "{} files written under {}",
            written.all().len(),
            layout.root().display()
        ),
    );
    outcome.written = Some(written);
    outcome.cleaned = Some(df);
    Ok(())
}

fn load(config: &PipelineConfig, log: &mut RunLog) -> Result<LoadedTable, PipelineError> {
    let loaded = load_table(&config.input_path).map_err(PipelineError::Input)?;
    let detail = match (&loaded.sheet, loaded.delimiter) {
        (Some(sheet), _) => format!(" (sheet {sheet})"),
        (None, Some(delimiter)) => format!(" (delimiter {:?})", char::from(delimiter)),
        (None, None) => String::new(),
    };
    log.info(
        Stage::Load.as_str(),
        format!(
            "{} rows x {} columns from {}{detail}, {:.2} MB",
            loaded.frame.height(),
            loaded.frame.width(),
            config.input_path.display(),
            loaded.memory_mb()
        ),
    );
    Ok(loaded)
}

fn record_temporal(log: &mut RunLog, temporal: &TemporalInfo) {
    let stage = Stage::Temporal.as_str();
    if !temporal.converted.is_empty() {
        log.info(
            stage,
            format!("converted to dates: {}", temporal.converted.join(", ")),
        );
    }
    for failure in &temporal.failed {
        log.warn(
            stage,
            format!("{} left unchanged: {}", failure.column, failure.reason),
        );
    }
    match &temporal.year_column {
        Some(year) if temporal.year_derived => {
            log.info(stage, format!("year column {year} derived from dates"));
        }
        Some(year) => log.info(stage, format!("year column {year}")),
        None => log.warn(stage, "no year column available"),
    }
    if !temporal.years_available.is_empty() {
        let years: Vec<String> = temporal
            .years_available
            .iter()
            .map(ToString::to_string)
            .collect();
        log.info(stage, format!("years available: {}", years.join(", ")));
    }
}

fn record_audit(log: &mut RunLog, quality: &QualityReport) {
    let stage = Stage::Audit.as_str();
    log.info(
        stage,
        format!(
            "{} duplicate rows ({:.2}%), average null {:.2}%",
            quality.duplicate_rows, quality.duplicate_percentage, quality.average_null_percentage
        ),
    );
    for column in &quality.columns {
        for stat in &column.sentinels {
            log.info(
                stage,
                format!(
                    "{}: {} cells hold sentinel {} ({:.2}%)",
                    column.name, stat.count, stat.code, stat.percentage
                ),
            );
        }
    }
    for problem in &quality.problem_columns {
        let flags: Vec<&str> = problem.problems.iter().map(|flag| flag.as_str()).collect();
        log.warn(stage, format!("{}: {}", problem.column, flags.join(", ")));
    }
    debug!(columns = quality.columns.len(), "audit recorded");
}

fn record_spatiotemporal(log: &mut RunLog, outcome: &SpatiotemporalOutcome) {
    let stage = Stage::Spatiotemporal.as_str();
    match outcome {
        SpatiotemporalOutcome::Complete(analysis) => {
            log.info(
                stage,
                format!(
                    "{} localities, years {:?}, {} rows discarded",
                    analysis.matrix.localities.len(),
                    analysis.matrix.years,
                    analysis.discarded_rows
                ),
            );
            for alert in &analysis.alerts {
                log.info(
                    stage,
                    format!(
                        "alert zone {}: {:.2}%",
                        alert.locality,
                        alert.change_percent.unwrap_or_default()
                    ),
                );
            }
        }
        SpatiotemporalOutcome::Insufficient { reason } => log.warn(stage, reason.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_are_not_fatal() {
        let error = PipelineError::Stage {
            stage: Stage::Temporal,
            source: anyhow::anyhow!("boom"),
        };
        assert!(!error.is_fatal());
        assert_eq!(error.to_string(), "stage temporal failed: boom");
        assert!(PipelineError::Config(ConfigError::MissingInput).is_fatal());
    }
}
