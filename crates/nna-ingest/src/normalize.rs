//! Column name normalization.
//!
//! Canonical names are upper-case ASCII words joined by single underscores.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{Column, DataFrame};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;

/// Two source headers that normalize to the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    /// Header that kept the canonical name.
    pub first: String,
    /// Header that was disambiguated.
    pub second: String,
    pub normalized: String,
    pub resolved_as: String,
}

/// Rename record of one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    /// Original → normalized, for changed names only.
    pub changes: BTreeMap<String, String>,
    pub collisions: Vec<NameCollision>,
}

impl ColumnMapping {
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }
}

fn transliterate(c: char) -> Option<char> {
    let mapped = match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        _ => return None,
    };
    Some(mapped)
}

/// Normalizes one header.
///
/// Trims, turns whitespace runs into `_`, folds Latin accents, drops every
/// other character outside `[A-Za-z0-9_]`, upper-cases, collapses repeated
/// underscores and strips them from both ends. Idempotent.
pub fn normalize_name(name: &str) -> String {
    let mut buffer = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                buffer.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        let c = transliterate(c).unwrap_or(c);
        if c.is_ascii_alphanumeric() || c == '_' {
            buffer.push(c.to_ascii_uppercase());
        }
    }

    let mut normalized = String::with_capacity(buffer.len());
    for c in buffer.chars() {
        if c == '_' && normalized.ends_with('_') {
            continue;
        }
        normalized.push(c);
    }
    normalized.trim_matches('_').to_string()
}

/// Renames every column to its canonical form, using the frame's own names
/// as the source headers.
///
/// A name that collides with an earlier column is logged and suffixed
/// (`_2`, `_3`, ...); an empty result becomes `COLUMN_<index>`.
pub fn normalize_columns(df: &DataFrame) -> Result<(DataFrame, ColumnMapping)> {
    let sources: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    normalize_columns_from(df, &sources)
}

/// Like [`normalize_columns`], but normalizes `sources[idx]` for column
/// `idx` when given.
///
/// Loaders make repeated headers unique before building the frame; passing
/// the header text as found in the file lets those repeats surface as
/// collisions. `changes` is keyed by the frame's column name.
pub fn normalize_columns_from(
    df: &DataFrame,
    sources: &[String],
) -> Result<(DataFrame, ColumnMapping)> {
    let mut mapping = ColumnMapping::default();
    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut owners: BTreeMap<String, String> = BTreeMap::new();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());

    for (idx, column) in df.get_columns().iter().enumerate() {
        let current = column.name().to_string();
        let original = sources.get(idx).cloned().unwrap_or_else(|| current.clone());
        let mut normalized = normalize_name(&original);
        if normalized.is_empty() {
            normalized = format!("COLUMN_{idx}");
        }

        let mut resolved = normalized.clone();
        if used.contains(&resolved) {
            let mut suffix = 2usize;
            while used.contains(&resolved) {
                resolved = format!("{normalized}_{suffix}");
                suffix += 1;
            }
            let first = owners.get(&normalized).cloned().unwrap_or_default();
            warn!(
                first = %first,
                second = %original,
                normalized = %normalized,
                resolved_as = %resolved,
                "column name collision after normalization"
            );
            mapping.collisions.push(NameCollision {
                first,
                second: original.clone(),
                normalized: normalized.clone(),
                resolved_as: resolved.clone(),
            });
        }

        used.insert(resolved.clone());
        owners
            .entry(normalized)
            .or_insert_with(|| original.clone());
        owners
            .entry(resolved.clone())
            .or_insert_with(|| original.clone());
        if resolved != current {
            mapping.changes.insert(current, resolved.clone());
        }
        columns.push(column.clone().with_name(resolved.as_str().into()));
    }

    let renamed = DataFrame::new(columns)?;
    info!(
        columns = renamed.width(),
        changed = mapping.changes.len(),
        collisions = mapping.collisions.len(),
        "normalized column names"
    );
    Ok((renamed, mapping))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, df};
    use proptest::prelude::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize_name("  Fecha de  Intervención "), "FECHA_DE_INTERVENCION");
        assert_eq!(normalize_name("AÑO"), "ANO");
        assert_eq!(normalize_name("__tipo--de__caso__"), "TIPODE_CASO");
        assert_eq!(normalize_name("% Avance (2021)"), "AVANCE_2021");
        assert_eq!(normalize_name("¿?"), "");
    }

    #[test]
    fn test_normalize_columns_mapping() {
        let df = df! {
            "Localidad" => &["Suba"],
            "AÑO" => &[2021i64],
            "VALOR" => &[1i64],
        }
        .unwrap();
        let (renamed, mapping) = normalize_columns(&df).unwrap();
        let names: Vec<String> = renamed
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["LOCALIDAD", "ANO", "VALOR"]);
        assert_eq!(mapping.changes.len(), 2);
        assert_eq!(mapping.changes["AÑO"], "ANO");
        assert!(!mapping.changes.contains_key("VALOR"));
        assert!(!mapping.has_collisions());
    }

    #[test]
    fn test_collision_is_suffixed() {
        let df = df! {
            "Tipo Caso" => &["a"],
            "TIPO_CASO" => &["b"],
            "tipo-caso!" => &["c"],
            "???" => &["d"],
        }
        .unwrap();
        let (renamed, mapping) = normalize_columns(&df).unwrap();
        let names: Vec<String> = renamed
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["TIPO_CASO", "TIPO_CASO_2", "TIPOCASO", "COLUMN_3"]);
        assert_eq!(mapping.collisions.len(), 1);
        assert_eq!(mapping.collisions[0].first, "Tipo Caso");
        assert_eq!(mapping.collisions[0].second, "TIPO_CASO");
        assert_eq!(mapping.changes["TIPO_CASO"], "TIPO_CASO_2");
    }

    #[test]
    fn collision_with_suffixed_name_keeps_its_source() {
        let df = df! {
            "A" => &[1i64],
            "a" => &[2i64],
            "A_2" => &[3i64],
        }
        .unwrap();
        let (renamed, mapping) = normalize_columns(&df).unwrap();
        let names: Vec<String> = renamed
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["A", "A_2", "A_2_2"]);
        assert_eq!(mapping.collisions.len(), 2);
        assert_eq!(mapping.collisions[1].first, "a");
        assert_eq!(mapping.collisions[1].second, "A_2");
        assert_eq!(mapping.collisions[1].resolved_as, "A_2_2");
    }

    #[test]
    fn repeated_source_headers_collide() {
        let df = df! {
            "Tipo Caso" => &["a"],
            "Tipo Caso.1" => &["b"],
            "Unnamed: 2" => &["c"],
        }
        .unwrap();
        let sources = vec!["Tipo Caso".to_string(), "Tipo Caso".to_string(), String::new()];
        let (renamed, mapping) = normalize_columns_from(&df, &sources).unwrap();
        let names: Vec<String> = renamed
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["TIPO_CASO", "TIPO_CASO_2", "COLUMN_2"]);
        assert_eq!(
            mapping.collisions,
            vec![NameCollision {
                first: "Tipo Caso".to_string(),
                second: "Tipo Caso".to_string(),
                normalized: "TIPO_CASO".to_string(),
                resolved_as: "TIPO_CASO_2".to_string(),
            }]
        );
        assert_eq!(mapping.changes["Tipo Caso.1"], "TIPO_CASO_2");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(name in "\\PC{0,40}") {
            let once = normalize_name(&name);
            prop_assert_eq!(normalize_name(&once), once.clone());
        }

        #[test]
        fn normalized_alphabet(name in "[ a-zA-Z0-9_ÁÉÍÓÚÑáéíóúñ%.()-]{0,40}") {
            let normalized = normalize_name(&name);
            prop_assert!(normalized
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!normalized.starts_with('_'));
            prop_assert!(!normalized.ends_with('_'));
            prop_assert!(!normalized.contains("__"));
        }
    }
}
