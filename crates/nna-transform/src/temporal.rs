//! Date column detection and year derivation.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PolarsResult, Series};
use serde::Serialize;
use tracing::{info, warn};

use nna_common::{any_to_date, column_strings};
use nna_model::{ColumnDiscovery, SentinelRegistry};
use nna_quality::integer_values;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const TIME_SUFFIXES: [&str; 3] = [" %H:%M:%S%.f", "T%H:%M:%S%.f", " %H:%M"];

/// A candidate column that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporalFailure {
    pub column: String,
    pub reason: String,
}

/// Outcome of temporal detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemporalInfo {
    /// Columns holding `Date` values after this stage.
    pub date_columns: Vec<String>,
    /// Text columns converted to `Date` here.
    pub converted: Vec<String>,
    pub failed: Vec<TemporalFailure>,
    pub year_column: Option<String>,
    /// Whether the year column was derived from a date column.
    pub year_derived: bool,
    /// Distinct years, sentinels and unparseable values excluded.
    pub years_available: Vec<i64>,
}

/// Parses a date in one of the accepted layouts, optionally followed by a
/// time of day.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
        for suffix in TIME_SUFFIXES {
            let layout = format!("{format}{suffix}");
            if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, &layout) {
                return Some(datetime.date());
            }
        }
    }
    None
}

fn date_series(name: &str, dates: &[Option<NaiveDate>]) -> PolarsResult<Series> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    let days: Vec<Option<i32>> = dates
        .iter()
        .map(|date| date.and_then(|d| i32::try_from((d - epoch).num_days()).ok()))
        .collect();
    Series::new(name.into(), days).cast(&DataType::Date)
}

/// Converts a text column when every non-null value is a date.
///
/// A column without a single date is not a date column and is left alone
/// silently; only a partially parsing column is an error.
fn convert_text_column(column: &Column) -> Result<Option<Series>, String> {
    let values = column_strings(column);
    let mut dates = Vec::with_capacity(values.len());
    let mut parsed = 0usize;
    let mut first_failure: Option<&str> = None;
    for value in &values {
        match value {
            None => dates.push(None),
            Some(text) => match parse_date(text) {
                Some(date) => {
                    parsed += 1;
                    dates.push(Some(date));
                }
                None => {
                    first_failure.get_or_insert(text.as_str());
                    dates.push(None);
                }
            },
        }
    }
    if parsed == 0 {
        return Ok(None);
    }
    if let Some(text) = first_failure {
        return Err(format!("value '{text}' is not a date"));
    }
    date_series(column.name().as_str(), &dates)
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Converts a text year column to `Int64` when every value is an integer.
///
/// Sentinel codes are integers too and survive as numbers.
fn integer_year(column: &Column) -> Option<Series> {
    let values = column_strings(column);
    let mut years = Vec::with_capacity(values.len());
    for value in values {
        match value {
            None => years.push(None),
            Some(text) => years.push(Some(nna_common::parse_i64(&text)?)),
        }
    }
    Some(Series::new(column.name().clone(), years))
}

/// Detects date columns, derives a year column if missing and lists the
/// available years.
///
/// Conversion failures leave the column unchanged and are reported in
/// [`TemporalInfo::failed`].
pub fn detect_temporal_columns(
    df: &DataFrame,
    discovery: &ColumnDiscovery,
    registry: &SentinelRegistry,
) -> PolarsResult<(DataFrame, TemporalInfo)> {
    let mut frame = df.clone();
    let mut info = TemporalInfo::default();
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let declared_year = discovery.year_column(names.iter().map(String::as_str));
    for name in discovery.temporal_columns(names.iter().map(String::as_str)) {
        if declared_year.as_deref() == Some(name.as_str()) {
            continue;
        }
        let column = frame.column(&name)?.clone();
        match column.dtype() {
            DataType::Date => info.date_columns.push(name),
            DataType::String => match convert_text_column(&column) {
                Ok(Some(series)) => {
                    frame.with_column(series)?;
                    info!(column = %name, "converted text column to dates");
                    info.date_columns.push(name.clone());
                    info.converted.push(name);
                }
                Ok(None) => {}
                Err(reason) => {
                    warn!(column = %name, reason = %reason, "date conversion skipped");
                    info.failed.push(TemporalFailure {
                        column: name,
                        reason,
                    });
                }
            },
            _ => {}
        }
    }

    info.year_column = declared_year;
    if info.year_column.is_none() {
        if let Some(source) = info.date_columns.first().cloned() {
            let target = discovery.derived_year_name.clone();
            if frame.column(&target).is_ok() {
                warn!(column = %target, "cannot derive year column: name already taken");
            } else {
                let column = frame.column(&source)?;
                let years: Vec<Option<i64>> = (0..column.len())
                    .map(|idx| {
                        column
                            .get(idx)
                            .ok()
                            .and_then(any_to_date)
                            .map(|date| i64::from(date.year()))
                    })
                    .collect();
                frame.with_column(Series::new(target.as_str().into(), years))?;
                info!(source = %source, column = %target, "derived year column");
                info.year_column = Some(target);
                info.year_derived = true;
            }
        }
    }

    if let Some(year) = info.year_column.clone() {
        let column = frame.column(&year)?.clone();
        if column.dtype() == &DataType::String {
            match integer_year(&column) {
                Some(series) => {
                    frame.with_column(series)?;
                }
                None => warn!(column = %year, "year column has non-integer values"),
            }
        }
        let column = frame.column(&year)?;
        let years: BTreeSet<i64> = integer_values(column, registry)
            .into_iter()
            .flatten()
            .collect();
        info.years_available = years.into_iter().collect();
    } else {
        warn!("no year column found");
    }

    info!(
        date_columns = info.date_columns.len(),
        failed = info.failed.len(),
        years = ?info.years_available,
        "temporal detection"
    );
    Ok((frame, info))
}
