//! Sentinel registry.
//!
//! A sentinel is a literal such as `99999` that the source system uses for
//! "not applicable". It is valid data: it never counts as a null, but it is
//! kept out of genuine-missingness figures and real-value statistics.
//!
//! The same logical value shows up as `99999` (integer column), `99999.0`
//! (float column) or `" 99999 "` (text column), so matching checks both the
//! numeric and the trimmed string form.

use polars::prelude::{AnyValue, Column, DataFrame, PolarsResult, Series};
use serde::{Deserialize, Serialize};

use nna_common::{any_to_f64, any_to_string, parse_f64};

/// Code used when no override list is configured.
pub const DEFAULT_SENTINEL: &str = "99999";

/// One registered sentinel literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelCode {
    literal: String,
    /// Numeric form; `None` when the literal does not parse, in which case
    /// the code matches by string only.
    numeric: Option<f64>,
}

impl SentinelCode {
    pub fn new(literal: impl Into<String>) -> Self {
        let literal = literal.into().trim().to_string();
        let numeric = parse_f64(&literal);
        Self { literal, numeric }
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn numeric(&self) -> Option<f64> {
        self.numeric
    }

    /// True iff the cell's numeric coercion equals the code's, or its trimmed
    /// string form equals the literal. Nulls never match.
    pub fn matches(&self, value: &AnyValue<'_>) -> bool {
        if matches!(value, AnyValue::Null) {
            return false;
        }
        if let (Some(code), Some(number)) = (self.numeric, any_to_f64(value.clone())) {
            if number == code {
                return true;
            }
        }
        any_to_string(value.clone()).trim() == self.literal
    }

    /// String-only variant used on raw text cells.
    pub fn matches_text(&self, value: &str) -> bool {
        let trimmed = value.trim();
        if trimmed == self.literal {
            return true;
        }
        matches!((self.numeric, parse_f64(trimmed)), (Some(code), Some(number)) if number == code)
    }
}

/// Where the active sentinel list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrySource {
    Default,
    Override,
}

/// Process configuration of valid-but-missing codes.
///
/// Built once before quality computation and passed by reference to every
/// stage; it is never mutated during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentinelRegistry {
    codes: Vec<SentinelCode>,
    source: RegistrySource,
}

impl Default for SentinelRegistry {
    fn default() -> Self {
        Self {
            codes: vec![SentinelCode::new(DEFAULT_SENTINEL)],
            source: RegistrySource::Default,
        }
    }
}

impl SentinelRegistry {
    /// Builds a registry from an explicit list. Blank entries are ignored;
    /// an empty list falls back to the default registry.
    pub fn with_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed: Vec<SentinelCode> = Vec::new();
        for code in codes {
            let code = SentinelCode::new(code);
            if code.literal.is_empty() || parsed.iter().any(|c| c.literal == code.literal) {
                continue;
            }
            parsed.push(code);
        }
        if parsed.is_empty() {
            return Self::default();
        }
        Self {
            codes: parsed,
            source: RegistrySource::Override,
        }
    }

    /// Uses the override list when present, otherwise the default registry.
    pub fn from_override(codes: Option<Vec<String>>) -> Self {
        match codes {
            Some(codes) => Self::with_codes(codes),
            None => Self::default(),
        }
    }

    pub fn codes(&self) -> &[SentinelCode] {
        &self.codes
    }

    pub fn source(&self) -> RegistrySource {
        self.source
    }

    /// First registered code; used as the canonical "not applicable" token.
    pub fn primary(&self) -> &SentinelCode {
        // with_codes never stores an empty list
        &self.codes[0]
    }

    pub fn is_sentinel(&self, value: &AnyValue<'_>, code: &SentinelCode) -> bool {
        code.matches(value)
    }

    /// Returns the first registered code the value matches.
    pub fn match_any(&self, value: &AnyValue<'_>) -> Option<&SentinelCode> {
        self.codes.iter().find(|code| code.matches(value))
    }

    pub fn is_any_sentinel(&self, value: &AnyValue<'_>) -> bool {
        self.match_any(value).is_some()
    }

    pub fn is_sentinel_text(&self, value: &str) -> bool {
        self.codes.iter().any(|code| code.matches_text(value))
    }

    /// Copy of `df` with every sentinel cell replaced by a true null.
    ///
    /// Only for computing "real" missingness and value statistics; the
    /// working table keeps its sentinels.
    pub fn strip_sentinels(&self, df: &DataFrame) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            columns.push(self.strip_column(column)?);
        }
        DataFrame::new(columns)
    }

    /// Column variant of [`Self::strip_sentinels`]; returns a clone when
    /// nothing matches.
    pub fn strip_column(&self, column: &Column) -> PolarsResult<Column> {
        let mut values: Vec<AnyValue<'_>> = Vec::with_capacity(column.len());
        let mut stripped = 0usize;
        for idx in 0..column.len() {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            if self.is_any_sentinel(&value) {
                stripped += 1;
                values.push(AnyValue::Null);
            } else {
                values.push(value);
            }
        }
        if stripped == 0 {
            return Ok(column.clone());
        }
        let series =
            Series::from_any_values_and_dtype(column.name().clone(), &values, column.dtype(), false)?;
        Ok(Column::from(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, df};

    #[test]
    fn default_registry_has_single_code() {
        let registry = SentinelRegistry::default();
        assert_eq!(registry.codes().len(), 1);
        assert_eq!(registry.primary().literal(), "99999");
        assert_eq!(registry.source(), RegistrySource::Default);
    }

    #[test]
    fn matches_numeric_and_string_forms() {
        let code = SentinelCode::new("99999");
        assert!(code.matches(&AnyValue::Int64(99999)));
        assert!(code.matches(&AnyValue::Float64(99999.0)));
        assert!(code.matches(&AnyValue::String(" 99999 ")));
        assert!(code.matches(&AnyValue::String("99999.0")));
        assert!(!code.matches(&AnyValue::String("99.999")));
        assert!(!code.matches(&AnyValue::Null));
        assert!(!code.matches(&AnyValue::Int64(9999)));
    }

    #[test]
    fn unparseable_code_matches_by_string_only() {
        let code = SentinelCode::new("N/A");
        assert_eq!(code.numeric(), None);
        assert!(code.matches(&AnyValue::String("N/A")));
        assert!(!code.matches(&AnyValue::String("n/a")));
        assert!(!code.matches(&AnyValue::Int64(0)));
    }

    #[test]
    fn override_list_replaces_default() {
        let registry = SentinelRegistry::with_codes(["99999", " 88888 ", "", "99999"]);
        let literals: Vec<&str> = registry.codes().iter().map(SentinelCode::literal).collect();
        assert_eq!(literals, vec!["99999", "88888"]);
        assert_eq!(registry.source(), RegistrySource::Override);
    }

    #[test]
    fn empty_override_falls_back_to_default() {
        let registry = SentinelRegistry::from_override(Some(vec![" ".to_string()]));
        assert_eq!(registry, SentinelRegistry::default());
        assert_eq!(SentinelRegistry::from_override(None), SentinelRegistry::default());
    }

    #[test]
    fn strip_sentinels_nulls_matching_cells_only() {
        let df = df! {
            "VALOR" => &[Some("99999"), None, Some("5")],
            "N" => &[Some(99999i64), Some(1), Some(2)],
        }
        .unwrap();
        let registry = SentinelRegistry::default();
        let stripped = registry.strip_sentinels(&df).unwrap();

        assert_eq!(stripped.column("VALOR").unwrap().null_count(), 2);
        assert_eq!(stripped.column("N").unwrap().null_count(), 1);
        // working table untouched
        assert_eq!(df.column("VALOR").unwrap().null_count(), 1);
        assert_eq!(stripped.column("N").unwrap().dtype(), df.column("N").unwrap().dtype());
    }
}
