//! Narrative summary of a run.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::Local;

use nna_analysis::SpatiotemporalOutcome;
use nna_model::VariableClass;

use crate::bundle::ReportInputs;
use crate::error::{ReportError, Result};

const MAX_LISTED: usize = 10;

/// Renders the Markdown summary; `tables` are listed by file name.
pub fn render_summary(inputs: &ReportInputs<'_>, tables: &[PathBuf]) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = render_into(&mut out, inputs, tables);
    out
}

fn render_into(out: &mut String, inputs: &ReportInputs<'_>, tables: &[PathBuf]) -> fmt::Result {
    let quality = inputs.quality;
    let source = inputs
        .source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| inputs.source.display().to_string());

    writeln!(out, "# Data understanding: NNA interventions\n")?;
    writeln!(
        out,
        "**Generated:** {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;

    writeln!(out, "## Source\n")?;
    writeln!(out, "- **File:** `{source}`")?;
    writeln!(out, "- **Rows:** {}", quality.total_rows)?;
    writeln!(out, "- **Columns:** {}", quality.total_columns)?;
    writeln!(out, "- **Memory:** {:.2} MB", quality.memory_mb)?;
    if !inputs.temporal.years_available.is_empty() {
        let years: Vec<String> = inputs
            .temporal
            .years_available
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(out, "- **Years available:** {}", years.join(", "))?;
    }
    if !inputs.pii.dropped.is_empty() {
        writeln!(
            out,
            "- **PII columns removed:** {}",
            inputs.pii.dropped.len()
        )?;
    }
    if !inputs.pii.hashed.is_empty() {
        writeln!(
            out,
            "- **Identifier columns hashed:** {}",
            inputs.pii.hashed.join(", ")
        )?;
    }
    if !inputs.mapping.collisions.is_empty() {
        writeln!(
            out,
            "- **Column name collisions:** {}",
            inputs.mapping.collisions.len()
        )?;
    }
    out.push('\n');

    writeln!(out, "## Data quality\n")?;
    writeln!(
        out,
        "- Duplicate rows: **{}** ({:.2}%)",
        quality.duplicate_rows, quality.duplicate_percentage
    )?;
    writeln!(
        out,
        "- Average null percentage: **{:.2}%**",
        quality.average_null_percentage
    )?;
    writeln!(
        out,
        "- Sentinel cells (valid, not applicable): **{}**",
        quality.total_sentinels()
    )?;
    writeln!(out, "- Constant columns: **{}**", quality.constant_columns)?;
    writeln!(
        out,
        "- Near-empty columns (>90% null): **{}**",
        quality.near_empty_columns
    )?;
    writeln!(
        out,
        "- Rows after cleaning: **{}**\n",
        inputs.final_quality.total_rows
    )?;

    let mut tally: BTreeMap<VariableClass, usize> = BTreeMap::new();
    for entry in inputs.dictionary {
        *tally.entry(entry.classification).or_default() += 1;
    }
    if !tally.is_empty() {
        writeln!(out, "### Variable classification\n")?;
        for (label, count) in &tally {
            writeln!(out, "- {}: **{count}** variables", label.dataset_label())?;
        }
        out.push('\n');
    }

    if !quality.problem_columns.is_empty() {
        writeln!(out, "### Problem columns\n")?;
        for problem in quality.problem_columns.iter().take(MAX_LISTED) {
            let flags: Vec<&str> = problem.problems.iter().map(|flag| flag.as_str()).collect();
            writeln!(out, "- `{}`: {}", problem.column, flags.join(", "))?;
        }
        out.push('\n');
    }

    writeln!(out, "## Spatiotemporal analysis\n")?;
    match inputs.spatiotemporal {
        SpatiotemporalOutcome::Complete(analysis) => {
            writeln!(
                out,
                "{} localities across {} years; {} rows discarded (no locality or year outside range).\n",
                analysis.matrix.localities.len(),
                analysis.matrix.years.len(),
                analysis.discarded_rows
            )?;
            if analysis.alerts.is_empty() {
                writeln!(out, "No alert zones.\n")?;
            } else {
                writeln!(out, "**Alert zones:** {}\n", analysis.alerts.len())?;
                writeln!(out, "| Locality | Change % | Trend |")?;
                writeln!(out, "|----------|----------|-------|")?;
                for alert in analysis.alerts.iter().take(MAX_LISTED) {
                    writeln!(
                        out,
                        "| {} | {:.1}% | {} |",
                        alert.locality,
                        alert.change_percent.unwrap_or_default(),
                        alert.trend.map(|t| t.as_str()).unwrap_or("-")
                    )?;
                }
                out.push('\n');
            }
        }
        SpatiotemporalOutcome::Insufficient { reason } => {
            writeln!(out, "Not computed: {reason}.\n")?;
        }
    }

    if !inputs.crosstabs.skipped.is_empty() {
        writeln!(out, "### Skipped cross analyses\n")?;
        for skipped in &inputs.crosstabs.skipped {
            writeln!(out, "- {skipped}")?;
        }
        out.push('\n');
    }

    writeln!(out, "## Generated tables\n")?;
    for table in tables {
        if let Some(name) = table.file_name() {
            writeln!(out, "- `{}`", name.to_string_lossy())?;
        }
    }
    Ok(())
}

pub fn write_summary_markdown(
    path: &Path,
    inputs: &ReportInputs<'_>,
    tables: &[PathBuf],
) -> Result<()> {
    std::fs::write(path, render_summary(inputs, tables)).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
