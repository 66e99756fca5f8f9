//! Personal data removal and identifier hashing.

use polars::prelude::{AnyValue, Column, DataFrame, NamedFrom, Series};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use nna_common::any_to_string;
use nna_model::{ColumnKind, PiiPolicy};

use crate::error::Result;

/// What the PII pass did to the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PiiReport {
    pub dropped: Vec<String>,
    pub hashed: Vec<String>,
}

/// First `length` hex characters of the SHA-256 digest of `value`.
pub fn hash_identifier(value: &str, length: usize) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(length);
    encoded
}

fn is_personal(name: &str, policy: &PiiPolicy) -> bool {
    let upper = name.to_uppercase();
    let exempt = policy
        .exceptions
        .iter()
        .any(|exception| upper.contains(&exception.to_uppercase()));
    !exempt
        && policy
            .patterns
            .iter()
            .any(|pattern| upper.contains(&pattern.to_uppercase()))
}

fn is_identifier(name: &str, policy: &PiiPolicy) -> bool {
    let upper = name.to_uppercase();
    if upper.contains("LOCALIDAD")
        || policy
            .hash_exclusions
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(&upper))
    {
        return false;
    }
    upper.split('_').any(|token| token == "ID")
}

fn hash_column(column: &Column, length: usize) -> Column {
    let values: Vec<Option<String>> = (0..column.len())
        .map(|idx| match column.get(idx) {
            Ok(AnyValue::Null) | Err(_) => None,
            Ok(value) => Some(hash_identifier(&any_to_string(value), length)),
        })
        .collect();
    Series::new(column.name().clone(), values).into()
}

/// Drops personal-data columns and hashes identifier columns.
///
/// Only textual and integer identifier columns are hashed; nulls stay null.
pub fn strip_pii(df: &DataFrame, policy: &PiiPolicy) -> Result<(DataFrame, PiiReport)> {
    let mut report = PiiReport::default();
    if !policy.enabled {
        return Ok((df.clone(), report));
    }

    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().to_string();
        if is_personal(&name, policy) {
            report.dropped.push(name);
            continue;
        }
        let hashable = column.dtype().is_integer()
            || ColumnKind::from_dtype(column.dtype()).is_textual();
        if policy.hash_identifiers && is_identifier(&name, policy) {
            if hashable {
                columns.push(hash_column(column, policy.hash_length));
                report.hashed.push(name);
                continue;
            }
            warn!(column = %name, dtype = %column.dtype(), "identifier column not hashed");
        }
        columns.push(column.clone());
    }

    let stripped = DataFrame::new(columns)?;
    info!(
        dropped = report.dropped.len(),
        hashed = report.hashed.len(),
        "removed personal data"
    );
    Ok((stripped, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;

    #[test]
    fn test_hash_identifier() {
        // sha256("abc")
        assert_eq!(hash_identifier("abc", 16), "ba7816bf8f01cfea");
        assert_eq!(hash_identifier("abc", 64).len(), 64);
    }

    #[test]
    fn test_personal_columns_dropped() {
        let df = df! {
            "NOMBRE_USUARIO" => &["Ana"],
            "TELEFONO_1" => &["300"],
            "NUMERO_DE_MANZANA" => &["12"],
            "LOCALIDAD" => &["Suba"],
        }
        .unwrap();
        let (stripped, report) = strip_pii(&df, &PiiPolicy::default()).unwrap();
        assert_eq!(report.dropped, vec!["NOMBRE_USUARIO", "TELEFONO_1"]);
        assert_eq!(stripped.width(), 2);
        assert!(stripped.column("NUMERO_DE_MANZANA").is_ok());
    }

    #[test]
    fn test_identifiers_hashed() {
        let df = df! {
            "ID_FIC" => &[Some(123i64), None],
            "ID_LOCALIDAD" => &[Some(11i64), Some(11)],
            "ID_LOCALIDAD_FIC" => &[Some("a"), Some("b")],
            "IDEAS" => &[Some("x"), Some("y")],
        }
        .unwrap();
        let (stripped, report) = strip_pii(&df, &PiiPolicy::default()).unwrap();
        assert_eq!(report.hashed, vec!["ID_FIC"]);

        let hashed = stripped.column("ID_FIC").unwrap();
        assert_eq!(
            any_to_string(hashed.get(0).unwrap()),
            hash_identifier("123", 16)
        );
        assert_eq!(hashed.null_count(), 1);
        assert_eq!(
            stripped.column("ID_LOCALIDAD").unwrap().get(0).unwrap(),
            AnyValue::Int64(11)
        );
    }

    #[test]
    fn test_disabled_policy_is_noop() {
        let df = df! { "NOMBRE" => &["Ana"] }.unwrap();
        let policy = PiiPolicy {
            enabled: false,
            ..PiiPolicy::default()
        };
        let (stripped, report) = strip_pii(&df, &policy).unwrap();
        assert_eq!(stripped.width(), 1);
        assert!(report.dropped.is_empty());
    }
}
