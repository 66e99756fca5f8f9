//! DataFrame construction from raw cells.
//!
//! Both readers produce a [`RawTable`]; this module picks the header row,
//! makes header names unique, and infers one dtype per column from content.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PolarsResult, Series};

use nna_common::{format_numeric, parse_f64, parse_i64};

/// One cell as delivered by a reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl RawCell {
    /// Text cell, or `Empty` for blank input.
    pub fn from_text(value: &str) -> Self {
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 => {
                Some(*v as i64)
            }
            Self::Text(s) => parse_i64(s),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v).filter(|v| v.is_finite()),
            Self::Text(s) => parse_f64(s),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => Some(s.clone()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(format_numeric(*v)),
            Self::Bool(v) => Some(v.to_string()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Header plus data rows, all rows padded to the header width.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Unique column names used for the frame.
    pub headers: Vec<String>,
    /// Header text as found in the file; blank headers are empty strings.
    pub source_headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    /// Uses the first non-blank row as header and drops fully blank rows.
    ///
    /// Returns `None` when every row is blank.
    pub fn from_rows(rows: Vec<Vec<RawCell>>) -> Option<Self> {
        let mut rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()));
        let header_row = rows.next()?;
        let data: Vec<Vec<RawCell>> = rows.collect();

        let width = data
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header_row.len()))
            .max()
            .unwrap_or(0);

        let raw_headers: Vec<Option<String>> = (0..width)
            .map(|idx| {
                header_row
                    .get(idx)
                    .and_then(RawCell::as_text)
                    .map(|s| s.trim().to_string())
            })
            .collect();
        let headers = unique_headers(&raw_headers);
        let source_headers = raw_headers
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();

        let data = data
            .into_iter()
            .map(|mut row| {
                row.resize(width, RawCell::Empty);
                row
            })
            .collect();

        Some(Self {
            headers,
            source_headers,
            rows: data,
        })
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Blank headers become `Unnamed: <idx>`; repeated names get `.1`, `.2`, ...
fn unique_headers(raw: &[Option<String>]) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut headers = Vec::with_capacity(raw.len());
    for (idx, name) in raw.iter().enumerate() {
        let base = match name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Unnamed: {idx}"),
        };
        let mut candidate = base.clone();
        let mut counter = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{counter}");
            counter += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inferred {
    Int,
    Float,
    Bool,
    Date,
    Text,
}

fn infer(cells: &[&RawCell]) -> Inferred {
    let mut present = cells.iter().filter(|cell| !cell.is_empty()).peekable();
    if present.peek().is_none() {
        return Inferred::Text;
    }
    let present: Vec<&&RawCell> = present.collect();
    if present.iter().all(|cell| cell.as_i64().is_some()) {
        Inferred::Int
    } else if present.iter().all(|cell| cell.as_f64().is_some()) {
        Inferred::Float
    } else if present.iter().all(|cell| cell.as_bool().is_some()) {
        Inferred::Bool
    } else if present.iter().all(|cell| cell.as_date().is_some()) {
        Inferred::Date
    } else {
        Inferred::Text
    }
}

fn days_since_epoch(date: NaiveDate) -> Option<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from(date.signed_duration_since(epoch).num_days()).ok()
}

/// Builds a DataFrame with one inferred dtype per column.
///
/// Integers → `Int64`, other numbers → `Float64`, `true`/`false` →
/// `Boolean`, date cells or ISO dates → `Date`, anything else → `String`.
/// Empty cells are nulls.
pub fn build_frame(table: &RawTable) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.width());
    for (idx, name) in table.headers.iter().enumerate() {
        let cells: Vec<&RawCell> = table.rows.iter().map(|row| &row[idx]).collect();
        let name = name.as_str().into();
        let series = match infer(&cells) {
            Inferred::Int => {
                let values: Vec<Option<i64>> = cells.iter().map(|c| c.as_i64()).collect();
                Series::new(name, values)
            }
            Inferred::Float => {
                let values: Vec<Option<f64>> = cells.iter().map(|c| c.as_f64()).collect();
                Series::new(name, values)
            }
            Inferred::Bool => {
                let values: Vec<Option<bool>> = cells.iter().map(|c| c.as_bool()).collect();
                Series::new(name, values)
            }
            Inferred::Date => {
                let values: Vec<Option<i32>> = cells
                    .iter()
                    .map(|c| c.as_date().and_then(days_since_epoch))
                    .collect();
                Series::new(name, values).cast(&DataType::Date)?
            }
            Inferred::Text => {
                let values: Vec<Option<String>> = cells.iter().map(|c| c.as_text()).collect();
                Series::new(name, values)
            }
        };
        columns.push(series.into());
    }
    DataFrame::new(columns)
}
