//! Full-row duplicate detection.

use std::collections::HashSet;

use polars::prelude::{AnyValue, BooleanChunked, DataFrame, NewChunkedArray, PolarsResult};
use tracing::debug;

use nna_common::any_to_string;

fn row_key(df: &DataFrame, idx: usize) -> Vec<Option<String>> {
    df.get_columns()
        .iter()
        .map(|column| match column.get(idx) {
            Ok(AnyValue::Null) | Err(_) => None,
            Ok(value) => Some(any_to_string(value)),
        })
        .collect()
}

/// `true` for the first occurrence of each distinct row, comparing all
/// columns. Nulls compare equal to nulls.
pub fn first_occurrence_mask(df: &DataFrame) -> Vec<bool> {
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(df.height());
    (0..df.height())
        .map(|idx| seen.insert(row_key(df, idx)))
        .collect()
}

/// Rows that exactly repeat an earlier row.
pub fn duplicate_count(df: &DataFrame) -> usize {
    first_occurrence_mask(df).iter().filter(|keep| !**keep).count()
}

/// Keeps the first occurrence of every row; returns the removed count.
pub fn drop_duplicates(df: &DataFrame) -> PolarsResult<(DataFrame, usize)> {
    let keep = first_occurrence_mask(df);
    let removed = keep.iter().filter(|keep| !**keep).count();
    if removed == 0 {
        return Ok((df.clone(), 0));
    }
    let mask = BooleanChunked::from_slice("dedupe".into(), &keep);
    let deduped = df.filter(&mask)?;
    debug!(removed, remaining = deduped.height(), "dropped duplicate rows");
    Ok((deduped, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, df};

    fn base() -> DataFrame {
        df! {
            "LOCALIDAD" => &[Some("Suba"), Some("Bosa"), None],
            "ANO" => &[Some(2021i64), Some(2022), None],
        }
        .unwrap()
    }

    #[test]
    fn appended_copy_adds_one_duplicate() {
        let df = base();
        assert_eq!(duplicate_count(&df), 0);

        let copy = df.slice(0, 1);
        let doubled = df.vstack(&copy).unwrap();
        assert_eq!(duplicate_count(&doubled), 1);

        let (deduped, removed) = drop_duplicates(&doubled).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(duplicate_count(&deduped), 0);
        assert_eq!(deduped.height(), 3);
    }

    #[test]
    fn null_rows_compare_equal() {
        let df = base();
        let nulls = df.slice(2, 1);
        let doubled = df.vstack(&nulls).unwrap();
        assert_eq!(duplicate_count(&doubled), 1);
    }

    #[test]
    fn first_occurrence_is_kept() {
        let df = df! {
            "K" => &["a", "b", "a", "a"],
        }
        .unwrap();
        assert_eq!(first_occurrence_mask(&df), vec![true, true, false, false]);
    }
}
