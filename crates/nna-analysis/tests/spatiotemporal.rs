//! Locality by year analysis over small in-memory tables.

use polars::prelude::{DataFrame, NamedFrom, df};

use nna_analysis::{SpatiotemporalOutcome, Trend, analyze_spatiotemporal, cross_analyses};
use nna_model::{ColumnDiscovery, SentinelRegistry, SpatiotemporalOptions};

fn rows(groups: &[(&str, i64, usize)]) -> (Vec<String>, Vec<i64>) {
    let mut localities = Vec::new();
    let mut years = Vec::new();
    for (locality, year, count) in groups {
        for _ in 0..*count {
            localities.push((*locality).to_string());
            years.push(*year);
        }
    }
    (localities, years)
}

fn two_localities() -> DataFrame {
    let (localities, years) = rows(&[("A", 2021, 10), ("A", 2022, 8), ("B", 2021, 5), ("B", 2022, 12)]);
    df! {
        "LOCALIDAD" => localities,
        "ANO" => years,
    }
    .unwrap()
}

#[test]
fn trends_and_alerts_for_two_localities() {
    let df = two_localities();
    let outcome = analyze_spatiotemporal(
        &df,
        Some("LOCALIDAD"),
        Some("ANO"),
        &SentinelRegistry::default(),
        &SpatiotemporalOptions::default(),
    )
    .unwrap();
    let SpatiotemporalOutcome::Complete(analysis) = outcome else {
        panic!("expected a complete analysis");
    };

    assert_eq!(analysis.discarded_rows, 0);
    assert_eq!(analysis.matrix.years, vec![2021, 2022]);
    assert_eq!(analysis.matrix.get("A", 2022), Some(8));
    assert_eq!(analysis.matrix.get("B", 2021), Some(5));

    let a = &analysis.trends[0];
    assert_eq!(a.locality, "A");
    assert_eq!(a.total, 18);
    assert_eq!(a.average_per_year, 9.0);
    assert_eq!(a.change_absolute, Some(-2));
    assert_eq!(a.change_percent, Some(-18.18));
    assert_eq!(a.trend, Some(Trend::ModerateDecrease));

    let b = &analysis.trends[1];
    assert_eq!(b.change_percent, Some(116.67));
    assert_eq!(b.trend, Some(Trend::StrongIncrease));

    let alerts: Vec<&str> = analysis.alerts.iter().map(|t| t.locality.as_str()).collect();
    assert_eq!(alerts, vec!["B"]);
}

#[test]
fn average_divides_by_every_year_in_the_matrix() {
    let (localities, years) = rows(&[("A", 2021, 6), ("A", 2023, 3), ("B", 2022, 3)]);
    let df = df! {
        "LOCALIDAD" => localities,
        "ANO" => years,
    }
    .unwrap();
    let outcome = analyze_spatiotemporal(
        &df,
        Some("LOCALIDAD"),
        Some("ANO"),
        &SentinelRegistry::default(),
        &SpatiotemporalOptions::default(),
    )
    .unwrap();
    let SpatiotemporalOutcome::Complete(analysis) = outcome else {
        panic!("expected a complete analysis");
    };

    assert_eq!(analysis.matrix.years, vec![2021, 2022, 2023]);
    assert_eq!(analysis.matrix.get("A", 2022), Some(0));
    let a = &analysis.trends[0];
    assert_eq!(a.locality, "A");
    assert_eq!(a.total, 9);
    assert_eq!(a.average_per_year, 3.0);
    assert_eq!(a.change_percent, Some(-42.86));
}

#[test]
fn out_of_range_and_sentinel_years_are_discarded() {
    let df = df! {
        "LOCALIDAD" => &[Some("A"), Some("A"), Some("A"), Some("B"), None, Some("  ")],
        "ANO" => &[Some(2021i64), Some(2019), Some(99999), None, Some(2022), Some(2022)],
    }
    .unwrap();
    let outcome = analyze_spatiotemporal(
        &df,
        Some("LOCALIDAD"),
        Some("ANO"),
        &SentinelRegistry::default(),
        &SpatiotemporalOptions::default(),
    )
    .unwrap();
    let SpatiotemporalOutcome::Complete(analysis) = outcome else {
        panic!("expected a complete analysis");
    };
    assert_eq!(analysis.discarded_rows, 5);
    assert_eq!(analysis.counts.len(), 1);
    assert_eq!(analysis.counts[0].count, 1);
    // one valid year: no change figures
    assert_eq!(analysis.trends[0].trend, None);
    assert!(analysis.alerts.is_empty());
}

#[test]
fn missing_year_column_is_insufficient() {
    let df = df! { "LOCALIDAD" => &["A", "B"] }.unwrap();
    let outcome = analyze_spatiotemporal(
        &df,
        Some("LOCALIDAD"),
        None,
        &SentinelRegistry::default(),
        &SpatiotemporalOptions::default(),
    )
    .unwrap();
    match outcome {
        SpatiotemporalOutcome::Insufficient { reason } => assert!(reason.contains("year=missing")),
        SpatiotemporalOutcome::Complete(_) => panic!("expected insufficient columns"),
    }
}

#[test]
fn outcome_serializes_with_status_tag() {
    let df = df! { "ANO" => &[2021i64] }.unwrap();
    let outcome = analyze_spatiotemporal(
        &df,
        None,
        Some("ANO"),
        &SentinelRegistry::default(),
        &SpatiotemporalOptions::default(),
    )
    .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "insufficient");
}

#[test]
fn year_by_intervention_type_crosstab() {
    let df = df! {
        "LOCALIDAD" => &["A", "A", "B"],
        "ANO" => &[2021i64, 2022, 2022],
        "TIPO_DE_INTERVENCION" => &["Visita", "Visita", "Taller"],
        "MOTIVO" => &["X", "Y", "X"],
        "SERVICIO" => &["S1", "S1", "S2"],
    }
    .unwrap();
    let analyses = cross_analyses(&df, &ColumnDiscovery::default(), Some("ANO")).unwrap();
    let names: Vec<&str> = analyses.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["locality_intervention_type", "year_intervention_type", "reason_service"]
    );
    let by_year = &analyses.tables[1].table;
    assert_eq!(by_year.get("2022", "Taller"), Some(1));
    assert_eq!(by_year.get("2021", "Taller"), Some(0));
    assert!(analyses.health_regime_column.is_none());
}
