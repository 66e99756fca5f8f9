//! Option groups deserialize from partial TOML tables.

use nna_model::{
    CleaningOptions, ColumnDiscovery, NamePattern, QualityReport, SpatiotemporalOptions,
    VariableClass,
};

#[test]
fn partial_table_keeps_defaults() {
    let options: SpatiotemporalOptions = toml::from_str("alert_threshold = 30.0").unwrap();
    assert_eq!(options.alert_threshold, 30.0);
    assert_eq!(options.min_year, 2021);
    assert_eq!(options.max_year, 2025);
}

#[test]
fn cleaning_placeholder_override() {
    let options: CleaningOptions = toml::from_str(
        r#"
placeholder = "Sin dato"
standardize_max_distinct = 25
"#,
    )
    .unwrap();
    assert_eq!(options.placeholder, "Sin dato");
    assert_eq!(options.standardize_max_distinct, 25);
    assert_eq!(options.affirmative_token, "YES");
}

#[test]
fn discovery_patterns_from_toml() {
    let discovery: ColumnDiscovery = toml::from_str(
        r#"
locality = [{ exact = "LOCALIDAD_FIC" }, { contains = "LOCALIDAD" }]
"#,
    )
    .unwrap();
    assert_eq!(
        discovery.locality,
        vec![
            NamePattern::exact("LOCALIDAD_FIC"),
            NamePattern::contains("LOCALIDAD"),
        ]
    );
    assert_eq!(
        discovery.locality_column(["LOCALIDAD", "LOCALIDAD_FIC"]).as_deref(),
        Some("LOCALIDAD_FIC")
    );
    assert_eq!(discovery.derived_year_name, "ANO");
}

#[test]
fn labels_serialize_in_dataset_vocabulary() {
    let json = serde_json::to_string(&VariableClass::NearEmpty).unwrap();
    assert_eq!(json, "\"Casi_vacia\"");
    let json = serde_json::to_string(&VariableClass::CategoricalHigh).unwrap();
    assert_eq!(json, "\"Categorica_alta\"");
    for label in VariableClass::ALL {
        let json = serde_json::to_string(&label).unwrap();
        assert_eq!(json, format!("\"{}\"", label.dataset_label()));
    }
}

#[test]
fn empty_report_serializes() {
    let report = QualityReport {
        total_rows: 0,
        total_columns: 0,
        duplicate_rows: 0,
        duplicate_percentage: 0.0,
        average_null_percentage: 0.0,
        constant_columns: 0,
        near_empty_columns: 0,
        memory_mb: 0.0,
        columns: Vec::new(),
        problem_columns: Vec::new(),
    };
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["total_rows"], 0);
    assert!(value["columns"].as_array().unwrap().is_empty());
}
