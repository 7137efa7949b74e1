//! Detected cost anomalies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::DimensionKey;

/// Ordinal classification of an anomaly's deviation magnitude
///
/// Ordered so that severity comparisons follow deviation bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AnomalySeverity {
    /// Severity bands, evaluated high-to-low: >1.0 critical, >0.5 high,
    /// >0.3 medium, else low. Monotonic and non-overlapping.
    pub fn from_deviation(deviation: f64) -> Self {
        if deviation > 1.0 {
            Self::Critical
        } else if deviation > 0.5 {
            Self::High
        } else if deviation > 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed catalog of causal factors an anomaly can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCause {
    UntaggedResources,
    UnusualUsage,
    Misconfiguration,
    ProviderPriceChange,
    DataTransferGrowth,
}

impl RootCause {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UntaggedResources => "untagged resources",
            Self::UnusualUsage => "unusual usage pattern",
            Self::Misconfiguration => "resource misconfiguration",
            Self::ProviderPriceChange => "provider price change",
            Self::DataTransferGrowth => "data transfer growth",
        }
    }
}

impl std::fmt::Display for RootCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a detected anomaly
///
/// Created `Active`; only the external resolution workflow transitions it
/// away from `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyStatus {
    Active,
    Resolved,
    Ignored,
}

/// A flagged deviation between actual and expected cost for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub dimension: DimensionKey,
    pub actual_cost: f64,
    pub expected_cost: f64,
    /// |actual - expected| / expected, always >= 0
    pub deviation: f64,
    pub severity: AnomalySeverity,
    pub root_cause: RootCause,
    pub status: AnomalyStatus,
}
