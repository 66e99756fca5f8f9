//! Declared column kinds.

use polars::prelude::DataType;
use serde::{Deserialize, Serialize};

/// Semantic kind of a column, inferred from its polars dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Textual,
    Temporal,
    Boolean,
    Other,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => Self::Numeric,
            DataType::String => Self::Textual,
            DataType::Date => Self::Temporal,
            DataType::Boolean => Self::Boolean,
            _ => Self::Other,
        }
    }

    pub fn is_numeric(self) -> bool {
        self == Self::Numeric
    }

    pub fn is_textual(self) -> bool {
        self == Self::Textual
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Textual => "textual",
            Self::Temporal => "temporal",
            Self::Boolean => "boolean",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_polars_dtypes() {
        assert_eq!(ColumnKind::from_dtype(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_dtype(&DataType::Float64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_dtype(&DataType::String), ColumnKind::Textual);
        assert_eq!(ColumnKind::from_dtype(&DataType::Date), ColumnKind::Temporal);
        assert_eq!(ColumnKind::from_dtype(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_dtype(&DataType::Null), ColumnKind::Other);
    }
}
