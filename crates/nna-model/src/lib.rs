//! Data model definitions for the NNA pipeline.
//!
//! Holds the types shared by every stage: the sentinel registry, column
//! kinds, classification labels, the quality report snapshot, and the
//! explicit pipeline configuration.

pub mod classification;
pub mod column;
pub mod config;
pub mod discovery;
pub mod error;
pub mod quality;
pub mod sentinel;

pub use classification::{ProblemFlag, VariableClass};
pub use column::ColumnKind;
pub use config::{
    CleaningOptions, PiiPolicy, PipelineConfig, ProfilingOptions, QualityThresholds,
    SpatiotemporalOptions,
};
pub use discovery::{ColumnDiscovery, NamePattern};
pub use error::{ModelError, Result};
pub use quality::{
    ColumnQuality, DictionaryEntry, NullStat, ProblemColumn, QualityReport, SentinelStat,
};
pub use sentinel::{DEFAULT_SENTINEL, RegistrySource, SentinelCode, SentinelRegistry};
