//! Everything a completed run exports, written in one pass.

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::{info, info_span};

use nna_analysis::{CrossAnalyses, ExploratoryProfile, SpatiotemporalOutcome};
use nna_ingest::{ColumnMapping, PiiReport};
use nna_model::{DictionaryEntry, QualityReport};
use nna_transform::TemporalInfo;

use crate::delimited::write_frame_csv;
use crate::error::Result;
use crate::json::{RunSummary, write_json};
use crate::layout::OutputLayout;
use crate::markdown::write_summary_markdown;
use crate::tables::{
    write_column_mapping, write_correlation_matrix, write_crosstabs, write_dictionary,
    write_frequencies, write_missing_report, write_numeric_stats, write_quality_report,
    write_spatiotemporal,
};
use crate::workbook::write_frame_xlsx;

/// Borrowed results of every stage, as handed to the writers.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub source: &'a Path,
    pub cleaned: &'a DataFrame,
    pub mapping: &'a ColumnMapping,
    pub pii: &'a PiiReport,
    pub temporal: &'a TemporalInfo,
    /// Audit of the uncleaned table; drives classification.
    pub quality: &'a QualityReport,
    /// Re-audit after cleaning.
    pub final_quality: &'a QualityReport,
    pub dictionary: &'a [DictionaryEntry],
    pub exploratory: &'a ExploratoryProfile,
    pub spatiotemporal: &'a SpatiotemporalOutcome,
    pub crosstabs: &'a CrossAnalyses,
}

/// Paths written by [`write_reports`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenReports {
    pub cleaned_csv: PathBuf,
    pub cleaned_xlsx: PathBuf,
    pub tables: Vec<PathBuf>,
    pub summary: PathBuf,
    pub run_summary: PathBuf,
}

impl WrittenReports {
    pub fn all(&self) -> Vec<&Path> {
        let mut paths = vec![self.cleaned_csv.as_path(), self.cleaned_xlsx.as_path()];
        paths.extend(self.tables.iter().map(PathBuf::as_path));
        paths.push(&self.summary);
        paths.push(&self.run_summary);
        paths
    }
}

/// Writes the cleaned table, every derived table, the narrative summary and
/// `run_summary.json`.
pub fn write_reports(layout: &OutputLayout, inputs: &ReportInputs<'_>) -> Result<WrittenReports> {
    let span = info_span!("export", output = %layout.root().display());
    let _guard = span.enter();

    layout.create()?;

    let cleaned_csv = layout.cleaned_csv();
    write_frame_csv(&cleaned_csv, inputs.cleaned)?;
    let cleaned_xlsx = layout.cleaned_xlsx();
    write_frame_xlsx(&cleaned_xlsx, inputs.cleaned)?;
    info!(
        rows = inputs.cleaned.height(),
        columns = inputs.cleaned.width(),
        "cleaned table exported"
    );

    let mut tables = vec![
        write_column_mapping(layout, inputs.mapping)?,
        write_quality_report(layout, inputs.quality)?,
        write_dictionary(layout, inputs.dictionary)?,
        write_missing_report(layout, inputs.quality)?,
        write_numeric_stats(layout, &inputs.exploratory.numeric)?,
    ];
    tables.extend(write_correlation_matrix(layout, &inputs.exploratory.correlation)?);
    tables.extend(write_frequencies(layout, &inputs.exploratory.frequencies)?);
    if let SpatiotemporalOutcome::Complete(analysis) = inputs.spatiotemporal {
        tables.extend(write_spatiotemporal(layout, analysis)?);
    }
    tables.extend(write_crosstabs(layout, inputs.crosstabs)?);

    let summary = layout.summary_markdown();
    write_summary_markdown(&summary, inputs, &tables)?;

    let run_summary = layout.run_summary();
    write_json(&run_summary, &RunSummary::from_frame(inputs.cleaned, &cleaned_xlsx))?;

    info!(tables = tables.len(), "reports written");
    Ok(WrittenReports {
        cleaned_csv,
        cleaned_xlsx,
        tables,
        summary,
        run_summary,
    })
}
