//! Cleaning stages run in pipeline order.

use polars::prelude::{AnyValue, DataFrame, NamedFrom, df};
use proptest::prelude::*;

use nna_common::column_strings;
use nna_model::{CleaningOptions, QualityThresholds, SentinelRegistry};
use nna_quality::{build_quality_report, drop_duplicates, sentinel_stats};
use nna_transform::{clean_text, impute_categorical, standardize_categories};

fn raw() -> DataFrame {
    df! {
        "LOCALIDAD" => &[Some("Suba "), Some("Suba"), Some("Bosa"), Some("Usme"), Some("Kennedy")],
        "ASISTE" => &[Some("Si"), Some("si"), Some("nan"), Some("99999"), Some("NO")],
        "VALOR" => &[Some(99999i64), Some(99999), Some(3), None, Some(4)],
    }
    .unwrap()
}

#[test]
fn sentinels_survive_the_cleaning_chain() {
    let registry = SentinelRegistry::default();
    let options = CleaningOptions::default();
    let before = sentinel_stats(&raw(), &registry);

    let (df, _) = clean_text(&raw()).unwrap();
    // "Suba " and "Suba" rows now differ only in ASISTE
    let (df, removed) = drop_duplicates(&df).unwrap();
    assert_eq!(removed, 0);
    let (df, imputed) = impute_categorical(&df, &options).unwrap();
    assert_eq!(imputed.len(), 1);
    let (df, _) = standardize_categories(&df, &options, &registry).unwrap();

    let after = sentinel_stats(&df, &registry);
    assert_eq!(before, after);

    let asiste = column_strings(df.column("ASISTE").unwrap());
    assert_eq!(
        asiste,
        vec![
            Some("YES".to_string()),
            Some("YES".to_string()),
            Some("No especificado".to_string()),
            Some("99999".to_string()),
            Some("NO".to_string()),
        ]
    );
    assert_eq!(df.column("VALOR").unwrap().get(3).unwrap(), AnyValue::Null);
}

#[test]
fn re_audit_reflects_cleaning() {
    let registry = SentinelRegistry::default();
    let thresholds = QualityThresholds::default();
    let (df, _) = clean_text(&raw()).unwrap();
    let report = build_quality_report(&df, &registry, &thresholds, 0).unwrap();
    assert_eq!(report.column("ASISTE").unwrap().nulls.count, 1);

    let (df, _) = impute_categorical(&df, &CleaningOptions::default()).unwrap();
    let report = build_quality_report(&df, &registry, &thresholds, 0).unwrap();
    assert_eq!(report.column("ASISTE").unwrap().nulls.count, 0);
    assert_eq!(report.column("VALOR").unwrap().nulls.count, 1);
}

proptest! {
    #[test]
    fn standardize_never_changes_nulls(
        cells in proptest::collection::vec(
            prop_oneof![Just(None), Just(Some("si")), Just(Some("99999")), Just(Some("x"))],
            1..30,
        )
    ) {
        let cells: Vec<Option<String>> = cells.into_iter().map(|c| c.map(str::to_string)).collect();
        let nulls = cells.iter().filter(|c| c.is_none()).count();
        let df = df! { "C" => cells }.unwrap();
        let (out, _) = standardize_categories(
            &df,
            &CleaningOptions::default(),
            &SentinelRegistry::default(),
        )
        .unwrap();
        prop_assert_eq!(out.column("C").unwrap().null_count(), nulls);
    }
}
