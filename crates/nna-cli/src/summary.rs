use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use nna_analysis::{LocalityTrend, SpatiotemporalOutcome, Trend};
use nna_cli::pipeline::{PipelineOutcome, RunStatus};

pub fn print_summary(outcome: &PipelineOutcome) {
    println!("Input: {}", outcome.source.display());
    if let Some(sheet) = &outcome.sheet {
        println!("Sheet: {sheet}");
    }
    println!("Output: {}", outcome.output_dir.display());
    println!("Run log: {}", outcome.run_log_path().display());

    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Rows loaded"),
        Cell::new(outcome.rows_loaded),
    ]);
    table.add_row(vec![
        Cell::new("Columns loaded"),
        Cell::new(outcome.columns_loaded),
    ]);
    table.add_row(vec![
        Cell::new("Renamed columns"),
        count_cell(Some(outcome.mapping.changes.len()), Color::Reset),
    ]);
    table.add_row(vec![
        Cell::new("Name collisions"),
        count_cell(Some(outcome.mapping.collisions.len()), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("PII columns dropped"),
        count_cell(Some(outcome.pii.dropped.len()), Color::Reset),
    ]);
    table.add_row(vec![
        Cell::new("Date columns converted"),
        count_cell(Some(outcome.temporal.converted.len()), Color::Reset),
    ]);
    table.add_row(vec![
        Cell::new("Year column"),
        match &outcome.temporal.year_column {
            Some(name) => Cell::new(name),
            None => dim_cell("-"),
        },
    ]);
    table.add_row(vec![
        Cell::new("Duplicate rows removed"),
        count_cell(Some(outcome.duplicates_removed), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Imputed columns"),
        count_cell(Some(outcome.imputed.len()), Color::Reset),
    ]);
    table.add_row(vec![
        Cell::new("Standardized columns"),
        count_cell(Some(outcome.standardized.len()), Color::Reset),
    ]);
    if let Some(quality) = &outcome.final_quality {
        table.add_row(vec![
            Cell::new("Final rows").add_attribute(Attribute::Bold),
            Cell::new(quality.total_rows).add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("Final columns").add_attribute(Attribute::Bold),
            Cell::new(quality.total_columns).add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("Average null %"),
            Cell::new(format!("{:.2}", quality.average_null_percentage)),
        ]);
        table.add_row(vec![
            Cell::new("Sentinel cells"),
            count_cell(Some(quality.total_sentinels()), Color::Reset),
        ]);
    }
    table.add_row(vec![
        Cell::new("Warnings"),
        count_cell(Some(outcome.warnings), Color::Yellow),
    ]);
    println!("{table}");

    print_label_table(outcome);
    if let Some(SpatiotemporalOutcome::Complete(analysis)) = &outcome.spatiotemporal {
        print_alert_table(&analysis.alerts);
    }
    if let Some(written) = &outcome.written {
        println!("Files written: {}", written.all().len());
    }
    if let RunStatus::Aborted { stage, error } = &outcome.status {
        eprintln!("Errors:");
        eprintln!("- stage {stage} failed: {error}");
    }
}

fn print_label_table(outcome: &PipelineOutcome) {
    let tally = outcome.label_tally();
    if tally.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Classification"), header_cell("Columns")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (label, count) in tally {
        table.add_row(vec![Cell::new(label.dataset_label()), Cell::new(count)]);
    }
    println!("{table}");
}

fn print_alert_table(alerts: &[LocalityTrend]) {
    if alerts.is_empty() {
        println!("No alert zones.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Alert zone"),
        header_cell("Total"),
        header_cell("Change"),
        header_cell("Change %"),
        header_cell("Trend"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for alert in alerts {
        table.add_row(vec![
            Cell::new(&alert.locality).add_attribute(Attribute::Bold),
            Cell::new(alert.total),
            match alert.change_absolute {
                Some(change) => Cell::new(format!("{change:+}")),
                None => dim_cell("-"),
            },
            match alert.change_percent {
                Some(percent) => Cell::new(format!("{percent:.2}")).fg(Color::Red),
                None => dim_cell("-"),
            },
            trend_cell(alert.trend),
        ]);
    }
    println!("{table}");
}

fn trend_cell(trend: Option<Trend>) -> Cell {
    match trend {
        Some(trend @ Trend::StrongIncrease) => Cell::new(trend.as_str())
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Some(trend @ Trend::ModerateIncrease) => Cell::new(trend.as_str()).fg(Color::Yellow),
        Some(trend) => Cell::new(trend.as_str()),
        None => dim_cell("-"),
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
