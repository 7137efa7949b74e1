//! Per-series cost patterns: baseline, trend, seasonality

use serde::{Deserialize, Serialize};

use super::record::DimensionKey;

/// Trend classification over a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Granularity of a detected seasonal pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityPeriod {
    /// Day-of-week recurrence
    Daily,
}

/// A recurring cost pattern detected via variance comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seasonality {
    pub period: SeasonalityPeriod,
    /// Ratio of the loudest bucket's variance to the mean bucket variance
    pub amplitude: f64,
}

/// One analyzed series: expected-cost baseline plus shape signals
///
/// Recomputed per analysis run, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPattern {
    pub dimension: DimensionKey,
    /// Most recent record's amount
    pub actual_cost: f64,
    /// Trailing moving average baseline
    pub expected_cost: f64,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<Seasonality>,
}

impl CostPattern {
    /// Normalized absolute gap between actual and expected cost.
    ///
    /// `None` when the expected cost is zero: the series carries no usable
    /// baseline and is excluded from anomaly detection.
    pub fn deviation(&self) -> Option<f64> {
        if self.expected_cost == 0.0 {
            return None;
        }
        Some((self.actual_cost - self.expected_cost).abs() / self.expected_cost)
    }
}
