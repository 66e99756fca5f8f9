//! Variable classification labels and problem flags.

use serde::{Deserialize, Serialize};

/// One mutually exclusive label per column.
///
/// Variants are listed in precedence order: the first rule that matches a
/// column decides its label. Serialized names follow the dataset's own
/// vocabulary so downstream dictionaries stay comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableClass {
    #[serde(rename = "Casi_vacia")]
    NearEmpty,
    #[serde(rename = "Constante")]
    Constant,
    #[serde(rename = "Identificador")]
    Identifier,
    #[serde(rename = "Categorica_baja")]
    CategoricalLow,
    #[serde(rename = "Categorica_media")]
    CategoricalMedium,
    #[serde(rename = "Alta_cardinalidad")]
    HighCardinality,
    #[serde(rename = "Numerica")]
    Numeric,
    #[serde(rename = "Categorica_alta")]
    CategoricalHigh,
}

impl VariableClass {
    pub const ALL: [VariableClass; 8] = [
        Self::NearEmpty,
        Self::Constant,
        Self::Identifier,
        Self::CategoricalLow,
        Self::CategoricalMedium,
        Self::HighCardinality,
        Self::Numeric,
        Self::CategoricalHigh,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NearEmpty => "near_empty",
            Self::Constant => "constant",
            Self::Identifier => "identifier",
            Self::CategoricalLow => "categorical_low",
            Self::CategoricalMedium => "categorical_medium",
            Self::HighCardinality => "high_cardinality",
            Self::Numeric => "numeric",
            Self::CategoricalHigh => "categorical_high",
        }
    }

    /// Name in the dataset's vocabulary; same as the serialized form.
    pub fn dataset_label(self) -> &'static str {
        match self {
            Self::NearEmpty => "Casi_vacia",
            Self::Constant => "Constante",
            Self::Identifier => "Identificador",
            Self::CategoricalLow => "Categorica_baja",
            Self::CategoricalMedium => "Categorica_media",
            Self::HighCardinality => "Alta_cardinalidad",
            Self::Numeric => "Numerica",
            Self::CategoricalHigh => "Categorica_alta",
        }
    }

    /// Labels that get frequency tables in exploratory profiling.
    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            Self::CategoricalLow | Self::CategoricalMedium | Self::CategoricalHigh
        )
    }
}

impl std::fmt::Display for VariableClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent data-quality flags; a column may carry several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProblemFlag {
    #[serde(rename = "constante")]
    Constant,
    #[serde(rename = "casi_vacia")]
    NearEmpty,
    #[serde(rename = "alta_cardinalidad")]
    HighCardinality,
}

impl ProblemFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::NearEmpty => "near_empty",
            Self::HighCardinality => "high_cardinality",
        }
    }
}

impl std::fmt::Display for ProblemFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
