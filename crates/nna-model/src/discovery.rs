//! Column discovery by header name.
//!
//! Semantic columns (locality, year, dates, intervention type) are found by
//! an ordered list of name predicates. The first predicate that matches any
//! column wins, and within a predicate the first column in table order.

use serde::{Deserialize, Serialize};

/// A predicate over a column name. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePattern {
    Exact(String),
    Contains(String),
    /// Every fragment must appear in the name.
    All(Vec<String>),
}

impl NamePattern {
    pub fn exact(value: &str) -> Self {
        Self::Exact(value.to_string())
    }

    pub fn contains(value: &str) -> Self {
        Self::Contains(value.to_string())
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_uppercase();
        match self {
            Self::Exact(expected) => name == expected.to_uppercase(),
            Self::Contains(fragment) => name.contains(&fragment.to_uppercase()),
            Self::All(fragments) => fragments
                .iter()
                .all(|fragment| name.contains(&fragment.to_uppercase())),
        }
    }
}

/// Finds the first column matching an ordered pattern list.
pub fn find_column<'a, I>(patterns: &[NamePattern], names: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    patterns.iter().find_map(|pattern| {
        names
            .iter()
            .find(|name| pattern.matches(name))
            .map(|name| (*name).to_string())
    })
}

/// Swappable discovery strategies for every semantic column the pipeline uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnDiscovery {
    pub locality: Vec<NamePattern>,
    pub year: Vec<NamePattern>,
    /// Columns that may hold dates or periods.
    pub temporal: Vec<NamePattern>,
    pub intervention_type: Vec<NamePattern>,
    pub health_regime: Vec<NamePattern>,
    pub reason: Vec<NamePattern>,
    pub service: Vec<NamePattern>,
    /// Name given to a year column derived from a date column.
    pub derived_year_name: String,
}

impl Default for ColumnDiscovery {
    fn default() -> Self {
        Self {
            locality: vec![NamePattern::contains("LOCALIDAD")],
            year: vec![
                NamePattern::exact("ANO"),
                NamePattern::exact("AÑO"),
                NamePattern::exact("ANIO"),
                NamePattern::exact("YEAR"),
            ],
            temporal: ["FECHA", "DATE", "ANO", "AÑO", "YEAR", "MES", "MONTH"]
                .into_iter()
                .map(NamePattern::contains)
                .collect(),
            intervention_type: vec![NamePattern::All(vec![
                "TIPO".to_string(),
                "INTERVENCION".to_string(),
            ])],
            health_regime: ["AFILIACION", "SGSSS", "REGIMEN"]
                .into_iter()
                .map(NamePattern::contains)
                .collect(),
            reason: vec![NamePattern::contains("MOTIVO")],
            service: vec![NamePattern::contains("SERVICIO")],
            derived_year_name: "ANO".to_string(),
        }
    }
}

impl ColumnDiscovery {
    pub fn locality_column<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Option<String> {
        find_column(&self.locality, names)
    }

    pub fn year_column<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Option<String> {
        find_column(&self.year, names)
    }

    pub fn intervention_type_column<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Option<String> {
        find_column(&self.intervention_type, names)
    }

    pub fn health_regime_column<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Option<String> {
        find_column(&self.health_regime, names)
    }

    /// All columns matching any temporal pattern, in table order.
    pub fn temporal_columns<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| self.temporal.iter().any(|pattern| pattern.matches(name)))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pattern_wins_over_table_order() {
        let patterns = vec![NamePattern::exact("ANO"), NamePattern::exact("YEAR")];
        let found = find_column(&patterns, ["YEAR", "ANO"]);
        assert_eq!(found.as_deref(), Some("ANO"));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let discovery = ColumnDiscovery::default();
        assert_eq!(
            discovery.locality_column(["ID", "localidad_fic", "LOCALIDAD"]).as_deref(),
            Some("localidad_fic")
        );
    }

    #[test]
    fn all_requires_every_fragment() {
        let discovery = ColumnDiscovery::default();
        assert_eq!(
            discovery
                .intervention_type_column(["TIPO_DOCUMENTO", "TIPO_DE_INTERVENCION"])
                .as_deref(),
            Some("TIPO_DE_INTERVENCION")
        );
        assert_eq!(discovery.intervention_type_column(["TIPO"]), None);
    }

    #[test]
    fn temporal_candidates_keep_table_order() {
        let discovery = ColumnDiscovery::default();
        let found = discovery.temporal_columns(["FECHA_INTERVENCION", "VALOR", "MES", "ANO"]);
        assert_eq!(found, vec!["FECHA_INTERVENCION", "MES", "ANO"]);
    }
}
