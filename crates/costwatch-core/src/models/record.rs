//! Raw cost records and series dimensions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project bucket for records without a project tag
pub const DEFAULT_PROJECT: &str = "default";

/// One billed cost sample for a cloud resource
///
/// Produced by the billing-ingestion collaborator; immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    /// When the cost was incurred
    pub timestamp: DateTime<Utc>,
    /// Cloud provider (e.g. "aws", "gcp", "azure")
    pub provider: String,
    /// Billed service (e.g. "ec2", "cloud-storage")
    pub service: String,
    /// Project tag, absent for untagged resources
    #[serde(default)]
    pub project: Option<String>,
    /// Cost amount in account currency
    pub amount: f64,
}

/// The (provider, service, project) triple identifying one cost series
///
/// `Ord` so grouped output iterates deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionKey {
    pub provider: String,
    pub service: String,
    pub project: String,
}

impl DimensionKey {
    pub fn new(
        provider: impl Into<String>,
        service: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            service: service.into(),
            project: project.into(),
        }
    }

    /// Derive the key for a record; untagged records land in the
    /// "default" project bucket.
    pub fn from_record(record: &CostRecord) -> Self {
        Self {
            provider: record.provider.clone(),
            service: record.service.clone(),
            project: record
                .project
                .clone()
                .unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
        }
    }

    /// Whether this series sits in the implicit untagged bucket
    pub fn is_default_project(&self) -> bool {
        self.project == DEFAULT_PROJECT
    }
}

impl std::fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.provider, self.service, self.project)
    }
}

/// Half-open time window for billing-store queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Last `days` days ending now
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts < self.end
    }
}
