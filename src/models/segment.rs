use serde::{Deserialize, Serialize};

/// Occurrence count for one raw value of a drill-down dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCount {
    pub value: String,
    pub count: usize,
}

/// Aggregate statistics for one segment of the table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SegmentStats {
    /// Raw dimension value that defines the segment.
    pub value: String,
    /// Number of rows in the segment.
    pub conversations: usize,
    /// Mean of `funnel_is_successful`, as a percentage.
    pub conversion_rate_pct: f64,
    /// Share of rows with positive overall sentiment, as a percentage.
    pub positive_sentiment_pct: f64,
    /// Mean agent score over numerically parseable entries, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_agent_score: Option<f64>,
}

/// Dataset-level KPI row for the executive overview.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OverviewStats {
    pub conversations: usize,
    pub conversion_rate_pct: f64,
    pub positive_sentiment_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_agent_score: Option<f64>,
}
