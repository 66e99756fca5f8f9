//! Explicit pipeline configuration.
//!
//! Every tunable lives here and the resolved object is handed to the
//! orchestrator; stages never read the environment themselves. The option
//! groups deserialize from partial TOML tables, missing keys keeping their
//! defaults.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::discovery::ColumnDiscovery;
use crate::error::{ModelError, Result};
use crate::sentinel::SentinelRegistry;

/// Thresholds of the quality engine, percentages on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Null percentage above which a column is near-empty.
    pub near_empty_percent: f64,
    /// Distinct/N ratio above which a textual column is flagged.
    pub high_cardinality_ratio: f64,
    /// Cardinality percentage above which a textual column classifies as
    /// high-cardinality.
    pub high_cardinality_percent: f64,
    pub categorical_low_max: usize,
    pub categorical_medium_max: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            near_empty_percent: 90.0,
            high_cardinality_ratio: 0.95,
            high_cardinality_percent: 90.0,
            categorical_low_max: 10,
            categorical_medium_max: 50,
        }
    }
}

/// Imputation and standardization policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningOptions {
    /// Columns at or above this null percentage are never imputed.
    pub impute_ceiling_percent: f64,
    pub placeholder: String,
    /// Only columns with fewer distinct values are standardized.
    pub standardize_max_distinct: usize,
    pub affirmative_token: String,
    pub negative_token: String,
    pub affirmative_variants: Vec<String>,
    pub negative_variants: Vec<String>,
    /// Spellings collapsed onto the primary sentinel code.
    pub not_applicable_variants: Vec<String>,
    pub drop_duplicates: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            impute_ceiling_percent: 50.0,
            placeholder: "No especificado".to_string(),
            standardize_max_distinct: 20,
            affirmative_token: "YES".to_string(),
            negative_token: "NO".to_string(),
            affirmative_variants: to_strings(&["si", "sí", "s", "1", "yes", "y", "true"]),
            negative_variants: to_strings(&["no", "n", "0", "false"]),
            not_applicable_variants: to_strings(&["no aplica", "n/a", "99.999"]),
            drop_duplicates: true,
        }
    }
}

/// Caps of the exploratory aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilingOptions {
    pub max_categorical: usize,
    pub max_numeric: usize,
    pub top_n: usize,
    /// Length of the missing-value ranking.
    pub missing_ranking: usize,
}

impl Default for ProfilingOptions {
    fn default() -> Self {
        Self {
            max_categorical: 15,
            max_numeric: 10,
            top_n: 20,
            missing_ranking: 20,
        }
    }
}

/// Locality × year trend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatiotemporalOptions {
    pub min_year: i64,
    pub max_year: i64,
    /// Absolute change percent above which a locality is an alert zone.
    pub alert_threshold: f64,
    pub strong_change: f64,
    pub moderate_change: f64,
}

impl Default for SpatiotemporalOptions {
    fn default() -> Self {
        Self {
            min_year: 2021,
            max_year: 2025,
            alert_threshold: 20.0,
            strong_change: 20.0,
            moderate_change: 5.0,
        }
    }
}

impl SpatiotemporalOptions {
    pub fn valid_years(&self) -> RangeInclusive<i64> {
        self.min_year..=self.max_year
    }
}

/// Which columns are dropped or hashed before profiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiiPolicy {
    pub enabled: bool,
    /// Name fragments that mark a column as personal data.
    pub patterns: Vec<String>,
    /// Names containing any of these are kept even if a pattern matches.
    pub exceptions: Vec<String>,
    pub hash_identifiers: bool,
    /// Identifier-like columns that are codes, not personal identifiers.
    pub hash_exclusions: Vec<String>,
    /// Hex characters kept from the digest.
    pub hash_length: usize,
}

impl Default for PiiPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: to_strings(&[
                "USUARIO",
                "NOMBRE",
                "APELLIDO",
                "DOCUMENTO",
                "CEDULA",
                "IDENTIFICACION",
                "DIRECCION",
                "DOMICILIO",
                "RESIDENCIA",
                "CORREO",
                "EMAIL",
                "MAIL",
                "TELEFONO",
                "CELULAR",
                "MOVIL",
                "CONTACTO",
                "RESPONSABLE",
                "ACUDIENTE",
                "TUTOR",
                "EAPB",
                "EPS",
            ]),
            exceptions: to_strings(&["NUMERO_DE_MANZANA", "NUMERO_DE_FICHA"]),
            hash_identifiers: true,
            hash_exclusions: to_strings(&["ID_LOCALIDAD", "ID_UPZ"]),
            hash_length: 16,
        }
    }
}

/// Fully resolved configuration of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub sentinels: SentinelRegistry,
    pub quality: QualityThresholds,
    pub cleaning: CleaningOptions,
    pub profiling: ProfilingOptions,
    pub spatiotemporal: SpatiotemporalOptions,
    pub discovery: ColumnDiscovery,
    pub pii: PiiPolicy,
}

impl PipelineConfig {
    /// Configuration with default tunables for the given paths.
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            sentinels: SentinelRegistry::default(),
            quality: QualityThresholds::default(),
            cleaning: CleaningOptions::default(),
            profiling: ProfilingOptions::default(),
            spatiotemporal: SpatiotemporalOptions::default(),
            discovery: ColumnDiscovery::default(),
            pii: PiiPolicy::default(),
        }
    }

    /// Rejects values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(invalid("input_path", "must not be empty"));
        }
        check_percent("quality.near_empty_percent", self.quality.near_empty_percent)?;
        check_percent(
            "quality.high_cardinality_percent",
            self.quality.high_cardinality_percent,
        )?;
        let ratio = self.quality.high_cardinality_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(invalid(
                "quality.high_cardinality_ratio",
                &format!("{ratio} is outside (0, 1]"),
            ));
        }
        if self.quality.categorical_low_max > self.quality.categorical_medium_max {
            return Err(invalid(
                "quality.categorical_low_max",
                "must not exceed categorical_medium_max",
            ));
        }
        check_percent(
            "cleaning.impute_ceiling_percent",
            self.cleaning.impute_ceiling_percent,
        )?;
        if self.cleaning.affirmative_token == self.cleaning.negative_token {
            return Err(invalid(
                "cleaning.affirmative_token",
                "must differ from negative_token",
            ));
        }
        if self.spatiotemporal.min_year > self.spatiotemporal.max_year {
            return Err(invalid(
                "spatiotemporal.min_year",
                &format!(
                    "{} is after max_year {}",
                    self.spatiotemporal.min_year, self.spatiotemporal.max_year
                ),
            ));
        }
        if self.spatiotemporal.moderate_change > self.spatiotemporal.strong_change {
            return Err(invalid(
                "spatiotemporal.moderate_change",
                "must not exceed strong_change",
            ));
        }
        if self.pii.hash_length == 0 || self.pii.hash_length > 64 {
            return Err(invalid("pii.hash_length", "must be within 1..=64"));
        }
        Ok(())
    }
}

fn check_percent(field: &str, value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, &format!("{value} is outside 0..=100")))
    }
}

fn invalid(field: &str, reason: &str) -> ModelError {
    ModelError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
