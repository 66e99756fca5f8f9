//! Aggregations computed from the cleaned table.
//!
//! Nothing here renders output; results are plain data handed to the
//! report writers.

mod correlation;
mod crosstab;
mod exploratory;
mod spatiotemporal;

pub use correlation::{CorrelationMatrix, correlation_matrix, pearson};
pub use crosstab::{CrossAnalyses, CrossTab, NamedCrossTab, cross_analyses, crosstab};
pub use exploratory::{
    ExploratoryProfile, FrequencyTable, NumericSummary, describe_numeric, exploratory_profile,
    top_n_frequencies,
};
pub use spatiotemporal::{
    LocalityTrend, LocalityYearCount, LocalityYearMatrix, SpatiotemporalAnalysis,
    SpatiotemporalOutcome, Trend, analyze_spatiotemporal, change_percent, classify_trend,
    group_counts, pivot,
};
