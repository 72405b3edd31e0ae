use anyhow::{Context, Result};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::models::{OverviewStats, SegmentCount, SegmentStats};

/// Closed-world list of placeholder values a drill-down dimension must not
/// surface as segments: empty strings, null markers, boolean-looking
/// strings, and anything too long to be a label.
#[derive(Debug, Clone)]
pub struct DegenerateValueFilter {
    skip_values: HashSet<String>,
    max_display_len: usize,
}

impl Default for DegenerateValueFilter {
    fn default() -> Self {
        let skip_values = [
            "", "unknown", "Unknown", "none", "None", "nan", "NaN", "True", "False",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            skip_values,
            max_display_len: 50,
        }
    }
}

impl DegenerateValueFilter {
    pub fn new(skip_values: HashSet<String>, max_display_len: usize) -> Self {
        Self {
            skip_values,
            max_display_len,
        }
    }

    pub fn is_degenerate(&self, value: &str) -> bool {
        self.skip_values.contains(value) || value.chars().count() >= self.max_display_len
    }
}

/// Read-only segment analytics over an assembled table. Works on the
/// DataFrame representation so synthetic tables and reloaded gold exports
/// are handled identically.
#[derive(Debug, Clone, Default)]
pub struct SegmentAggregator {
    filter: DegenerateValueFilter,
}

impl SegmentAggregator {
    pub fn new(filter: DegenerateValueFilter) -> Self {
        Self { filter }
    }

    /// Occurrence counts per raw dimension value, descending. Null and
    /// degenerate values are dropped; ties break on the value so output is
    /// deterministic.
    pub fn value_counts(&self, df: &DataFrame, dimension: &str) -> Result<Vec<SegmentCount>> {
        let series = df
            .column(dimension)
            .with_context(|| format!("Missing dimension column: {}", dimension))?
            .cast(&DataType::Utf8)?;
        let values = series.utf8()?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in values.into_iter().flatten() {
            if self.filter.is_degenerate(value) {
                continue;
            }
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }

        let mut out: Vec<SegmentCount> = counts
            .into_iter()
            .map(|(value, count)| SegmentCount { value, count })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        Ok(out)
    }

    /// Aggregate statistics for the rows whose dimension equals `value`.
    pub fn segment_stats(
        &self,
        df: &DataFrame,
        dimension: &str,
        value: &str,
    ) -> Result<SegmentStats> {
        let series = df
            .column(dimension)
            .with_context(|| format!("Missing dimension column: {}", dimension))?
            .cast(&DataType::Utf8)?;
        let dim = series.utf8()?;

        let rows: Vec<usize> = dim
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| (v == Some(value)).then_some(i))
            .collect();

        if rows.is_empty() {
            return Ok(SegmentStats {
                value: value.to_string(),
                ..SegmentStats::default()
            });
        }

        let conversion_rate_pct = numeric_mean_at(df, "funnel_is_successful", &rows)?
            .map(|mean| mean * 100.0)
            .unwrap_or(0.0);
        let positive_sentiment_pct = positive_share(df, &rows)? * 100.0;
        let avg_agent_score = numeric_mean_at(df, "agent_overall_score", &rows)?;

        Ok(SegmentStats {
            value: value.to_string(),
            conversations: rows.len(),
            conversion_rate_pct,
            positive_sentiment_pct,
            avg_agent_score,
        })
    }

    /// Dataset-level KPI row across the whole table.
    pub fn overview(&self, df: &DataFrame) -> Result<OverviewStats> {
        let n = df.height();
        if n == 0 {
            return Ok(OverviewStats::default());
        }
        let rows: Vec<usize> = (0..n).collect();

        Ok(OverviewStats {
            conversations: n,
            conversion_rate_pct: numeric_mean_at(df, "funnel_is_successful", &rows)?
                .map(|mean| mean * 100.0)
                .unwrap_or(0.0),
            positive_sentiment_pct: positive_share(df, &rows)? * 100.0,
            avg_sentiment_score: numeric_mean_at(df, "sentiment_score", &rows)?,
            avg_agent_score: numeric_mean_at(df, "agent_overall_score", &rows)?,
        })
    }
}

/// Share of the given rows whose overall sentiment is positive. Missing
/// values count against the denominator, not as positive.
fn positive_share(df: &DataFrame, rows: &[usize]) -> Result<f64> {
    let series = df
        .column("sentiment_overall")
        .context("Missing sentiment_overall column")?
        .cast(&DataType::Utf8)?;
    let sentiments = series.utf8()?;

    let positive = rows
        .iter()
        .filter(|&&i| sentiments.get(i) == Some("positive"))
        .count();
    Ok(positive as f64 / rows.len() as f64)
}

/// Mean of a column over the given rows. Numeric columns are cast to f64;
/// string columns are parsed per value. Nulls and non-numeric entries are
/// excluded from the mean, never treated as zero.
fn numeric_mean_at(df: &DataFrame, column: &str, rows: &[usize]) -> Result<Option<f64>> {
    let series = df
        .column(column)
        .with_context(|| format!("Missing numeric column: {}", column))?;

    let mut sum = 0.0;
    let mut count = 0usize;

    if series.dtype().is_numeric() {
        let casted = series.cast(&DataType::Float64)?;
        let values = casted.f64()?;
        for &i in rows {
            if let Some(v) = values.get(i) {
                if v.is_finite() {
                    sum += v;
                    count += 1;
                }
            }
        }
    } else {
        let casted = series.cast(&DataType::Utf8)?;
        let values = casted.utf8()?;
        for &i in rows {
            if let Some(text) = values.get(i) {
                if let Ok(v) = text.trim().parse::<f64>() {
                    sum += v;
                    count += 1;
                }
            }
        }
    }

    if count == 0 {
        return Ok(None);
    }
    Ok(Some(sum / count as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::assembler::generate;

    fn uniform_positive_table() -> DataFrame {
        DataFrame::new(vec![
            Series::new("intent_primary", vec!["mua_hang", "mua_hang", "hoi_gia"]),
            Series::new("funnel_is_successful", vec![1u32, 1, 1]),
            Series::new("sentiment_overall", vec!["positive", "positive", "positive"]),
            Series::new("agent_overall_score", vec![8.0f64, 9.0, 7.0]),
            Series::new("sentiment_score", vec![8.5f64, 9.0, 7.5]),
        ])
        .unwrap()
    }

    #[test]
    fn saturated_segment_reports_full_rates() {
        let df = uniform_positive_table();
        let stats = SegmentAggregator::default()
            .segment_stats(&df, "intent_primary", "mua_hang")
            .unwrap();

        assert_eq!(stats.conversations, 2);
        assert_eq!(stats.conversion_rate_pct, 100.0);
        assert_eq!(stats.positive_sentiment_pct, 100.0);
        assert_eq!(stats.avg_agent_score, Some(8.5));
    }

    #[test]
    fn degenerate_values_are_excluded_from_counts() {
        let long_value = "x".repeat(60);
        let df = DataFrame::new(vec![Series::new(
            "dim",
            vec![
                "warm_lead",
                "warm_lead",
                "cold_lead",
                "",
                "unknown",
                "None",
                "True",
                long_value.as_str(),
            ],
        )])
        .unwrap();

        let counts = SegmentAggregator::default().value_counts(&df, "dim").unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].value, "warm_lead");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].value, "cold_lead");
        assert_eq!(counts[1].count, 1);
    }

    #[test]
    fn counts_are_ordered_by_descending_count() {
        let table = generate(1_000, 42).unwrap();
        let df = table.to_dataframe().unwrap();

        let counts = SegmentAggregator::default()
            .value_counts(&df, "sentiment_overall")
            .unwrap();
        assert_eq!(counts.len(), 3);
        assert!(counts[0].count >= counts[1].count);
        assert!(counts[1].count >= counts[2].count);
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 1_000);
    }

    #[test]
    fn non_numeric_scores_are_excluded_from_the_mean() {
        let df = DataFrame::new(vec![
            Series::new("dim", vec!["a", "a", "a"]),
            Series::new("funnel_is_successful", vec![1u32, 0, 1]),
            Series::new("sentiment_overall", vec!["positive", "negative", "neutral"]),
            Series::new("agent_overall_score", vec!["8.0", "N/A", "6.0"]),
        ])
        .unwrap();

        let stats = SegmentAggregator::default()
            .segment_stats(&df, "dim", "a")
            .unwrap();
        assert_eq!(stats.avg_agent_score, Some(7.0));
    }

    #[test]
    fn unknown_segment_value_yields_empty_stats() {
        let df = uniform_positive_table();
        let stats = SegmentAggregator::default()
            .segment_stats(&df, "intent_primary", "khieu_nai")
            .unwrap();
        assert_eq!(stats.conversations, 0);
        assert_eq!(stats.avg_agent_score, None);
    }

    #[test]
    fn overview_covers_the_whole_table() {
        let df = uniform_positive_table();
        let overview = SegmentAggregator::default().overview(&df).unwrap();

        assert_eq!(overview.conversations, 3);
        assert_eq!(overview.conversion_rate_pct, 100.0);
        assert_eq!(overview.positive_sentiment_pct, 100.0);
        assert_eq!(overview.avg_agent_score, Some(8.0));
    }

    #[test]
    fn aggregation_does_not_mutate_the_source() {
        let table = generate(200, 7).unwrap();
        let df = table.to_dataframe().unwrap();
        let before = df.clone();

        let aggregator = SegmentAggregator::default();
        aggregator.value_counts(&df, "intent_primary").unwrap();
        aggregator.segment_stats(&df, "sentiment_overall", "positive").unwrap();
        aggregator.overview(&df).unwrap();

        assert_eq!(df.shape(), before.shape());
        assert_eq!(
            df.column("conversation_id").unwrap().null_count(),
            before.column("conversation_id").unwrap().null_count()
        );
    }
}
