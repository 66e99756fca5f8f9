//! True-null and sentinel statistics.
//!
//! A sentinel cell is administratively valid data. It is never counted as
//! a null; it only enters the "effective missing" figure, which is the null
//! count of the sentinel-stripped copy.

use polars::prelude::{DataFrame, PolarsResult};

use nna_model::{NullStat, SentinelRegistry, SentinelStat};

/// Sentinel matches of one column, codes with zero matches omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSentinels {
    pub column: String,
    pub stats: Vec<SentinelStat>,
}

impl ColumnSentinels {
    pub fn total(&self) -> usize {
        self.stats.iter().map(|stat| stat.count).sum()
    }
}

/// Genuine null count and percentage per column, in table order.
pub fn true_null_stats(df: &DataFrame) -> Vec<(String, NullStat)> {
    let rows = df.height();
    df.get_columns()
        .iter()
        .map(|column| {
            (
                column.name().to_string(),
                NullStat::new(column.null_count(), rows),
            )
        })
        .collect()
}

/// Per-column, per-code sentinel matches; only columns with a match are
/// reported.
///
/// Cells that cannot be read degrade to "no match".
pub fn sentinel_stats(df: &DataFrame, registry: &SentinelRegistry) -> Vec<ColumnSentinels> {
    let rows = df.height();
    let mut reported = Vec::new();
    for column in df.get_columns() {
        let mut counts = vec![0usize; registry.codes().len()];
        for idx in 0..column.len() {
            let Ok(value) = column.get(idx) else {
                continue;
            };
            for (slot, code) in registry.codes().iter().enumerate() {
                if registry.is_sentinel(&value, code) {
                    counts[slot] += 1;
                }
            }
        }
        let stats: Vec<SentinelStat> = registry
            .codes()
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(code, count)| {
                let stat = NullStat::new(count, rows);
                SentinelStat {
                    code: code.literal().to_string(),
                    count,
                    percentage: stat.percentage,
                }
            })
            .collect();
        if !stats.is_empty() {
            reported.push(ColumnSentinels {
                column: column.name().to_string(),
                stats,
            });
        }
    }
    reported
}

/// Nulls plus sentinel matches per column, in table order.
pub fn effective_missing(
    df: &DataFrame,
    registry: &SentinelRegistry,
) -> PolarsResult<Vec<(String, NullStat)>> {
    let stripped = registry.strip_sentinels(df)?;
    Ok(true_null_stats(&stripped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, df};

    fn scenario_a() -> DataFrame {
        df! {
            "LOCALIDAD" => &["X", "X", "X"],
            "AÑO" => &[2021i64, 2021, 2022],
            "VALOR" => &[Some("99999"), None, Some("5")],
        }
        .unwrap()
    }

    #[test]
    fn sentinel_is_not_a_null() {
        let df = scenario_a();
        let nulls = true_null_stats(&df);
        let (name, valor) = &nulls[2];
        assert_eq!(name, "VALOR");
        assert_eq!(valor.count, 1);
        assert!((valor.percentage - 33.3).abs() < 0.05);
    }

    #[test]
    fn sentinel_is_counted_per_code() {
        let df = scenario_a();
        let stats = sentinel_stats(&df, &SentinelRegistry::default());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].column, "VALOR");
        assert_eq!(stats[0].stats[0].code, "99999");
        assert_eq!(stats[0].stats[0].count, 1);
        assert_eq!(stats[0].total(), 1);
    }

    #[test]
    fn numeric_sentinels_match_too() {
        let df = df! {
            "EDAD" => &[Some(99999i64), Some(12), None],
            "PESO" => &[Some(99999.0f64), Some(30.5), Some(99999.0)],
        }
        .unwrap();
        let registry = SentinelRegistry::with_codes(["99999", "88888"]);
        let stats = sentinel_stats(&df, &registry);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[1].stats.len(), 1);
        assert_eq!(stats[1].stats[0].count, 2);
    }

    #[test]
    fn effective_missing_folds_sentinels() {
        let df = scenario_a();
        let missing = effective_missing(&df, &SentinelRegistry::default()).unwrap();
        assert_eq!(missing[2].1.count, 2);
        assert_eq!(missing[0].1.count, 0);
    }
}
