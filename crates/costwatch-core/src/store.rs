//! Store seams and the in-memory implementation
//!
//! Every persistence concern is an injected trait object, never a
//! process-wide client: tests and the CLI substitute `MemoryStore`, the
//! platform wires its own SQL-backed collaborators.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::alert::{AlertConfig, AlertStatus};
use crate::models::anomaly::Anomaly;
use crate::models::record::{CostRecord, DimensionKey, TimeWindow};

/// Read access to ingested billing records
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Fetch a user's cost records, optionally narrowed to one dimension,
    /// within a time window.
    async fn fetch_cost_records(
        &self,
        user_id: &str,
        filter: Option<&DimensionKey>,
        window: TimeWindow,
    ) -> Result<Vec<CostRecord>, CoreError>;
}

/// Read access to per-user alerting configuration
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// A user's alert configuration; `AlertConfig::default()` when the
    /// user has none stored.
    async fn alert_config(&self, user_id: &str) -> Result<AlertConfig, CoreError>;
}

/// Write access for detected anomalies
#[async_trait]
pub trait AnomalyStore: Send + Sync {
    /// Persist one run's anomalies as a single atomic batch.
    async fn save_anomalies(&self, user_id: &str, anomalies: &[Anomaly])
        -> Result<(), CoreError>;
}

/// Write access for alert lifecycle status
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn update_alert_status(
        &self,
        alert_id: Uuid,
        status: AlertStatus,
    ) -> Result<(), CoreError>;
}

/// In-memory store implementing every seam
///
/// DashMap for the per-user maps (per-entry locking), parking_lot RwLock
/// for the rarely-written default config.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, Vec<CostRecord>>,
    configs: DashMap<String, AlertConfig>,
    anomalies: DashMap<String, Vec<Anomaly>>,
    alert_statuses: DashMap<Uuid, AlertStatus>,
    fallback_config: RwLock<AlertConfig>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed billing records for a user
    pub fn insert_records(&self, user_id: impl Into<String>, records: Vec<CostRecord>) {
        self.records.entry(user_id.into()).or_default().extend(records);
    }

    /// Store a user-specific alert configuration
    pub fn set_alert_config(&self, user_id: impl Into<String>, config: AlertConfig) {
        self.configs.insert(user_id.into(), config);
    }

    /// Replace the fallback configuration applied to unknown users
    pub fn set_fallback_config(&self, config: AlertConfig) {
        *self.fallback_config.write() = config;
    }

    /// Read back a user's persisted anomalies (dashboard surface)
    pub fn anomalies_for(&self, user_id: &str) -> Vec<Anomaly> {
        self.anomalies
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Read back an alert's recorded status (dashboard surface)
    pub fn alert_status(&self, alert_id: Uuid) -> Option<AlertStatus> {
        self.alert_statuses.get(&alert_id).map(|entry| *entry)
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn fetch_cost_records(
        &self,
        user_id: &str,
        filter: Option<&DimensionKey>,
        window: TimeWindow,
    ) -> Result<Vec<CostRecord>, CoreError> {
        let records = self
            .records
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        Ok(records
            .into_iter()
            .filter(|r| window.contains(&r.timestamp))
            .filter(|r| filter.is_none_or(|key| DimensionKey::from_record(r) == *key))
            .collect())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn alert_config(&self, user_id: &str) -> Result<AlertConfig, CoreError> {
        Ok(self
            .configs
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| self.fallback_config.read().clone()))
    }
}

#[async_trait]
impl AnomalyStore for MemoryStore {
    async fn save_anomalies(
        &self,
        user_id: &str,
        anomalies: &[Anomaly],
    ) -> Result<(), CoreError> {
        self.anomalies
            .entry(user_id.to_string())
            .or_default()
            .extend_from_slice(anomalies);
        Ok(())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn update_alert_status(
        &self,
        alert_id: Uuid,
        status: AlertStatus,
    ) -> Result<(), CoreError> {
        self.alert_statuses.insert(alert_id, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(days_ago: i64, project: Option<&str>) -> CostRecord {
        CostRecord {
            timestamp: Utc::now() - Duration::days(days_ago),
            provider: "aws".to_string(),
            service: "ec2".to_string(),
            project: project.map(String::from),
            amount: 10.0,
        }
    }

    #[tokio::test]
    async fn test_fetch_applies_window() {
        let store = MemoryStore::new();
        store.insert_records("u1", vec![record(1, None), record(40, None)]);

        let fetched = store
            .fetch_cost_records("u1", None, TimeWindow::last_days(30))
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_applies_dimension_filter() {
        let store = MemoryStore::new();
        store.insert_records("u1", vec![record(1, Some("web")), record(1, None)]);

        let key = DimensionKey::new("aws", "ec2", "web");
        let fetched = store
            .fetch_cost_records("u1", Some(&key), TimeWindow::last_days(30))
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].project.as_deref(), Some("web"));
    }

    #[tokio::test]
    async fn test_unknown_user_gets_fallback_config() {
        let store = MemoryStore::new();
        let config = store.alert_config("nobody").await.unwrap();
        assert_eq!(config, AlertConfig::default());
    }

    #[tokio::test]
    async fn test_stored_config_wins_over_fallback() {
        let store = MemoryStore::new();
        let mut config = AlertConfig::default();
        config.channels.chat = true;
        store.set_alert_config("u1", config.clone());

        assert_eq!(store.alert_config("u1").await.unwrap(), config);
    }
}
