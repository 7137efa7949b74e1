//! Alerts and per-user alerting configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::anomaly::{Anomaly, AnomalySeverity};

/// Notification delivery mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Chat,
    InApp,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Chat => "chat",
            Self::InApp => "in_app",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which channels a user has enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSet {
    pub email: bool,
    pub chat: bool,
    pub in_app: bool,
}

impl ChannelSet {
    pub fn is_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email,
            Channel::Chat => self.chat,
            Channel::InApp => self.in_app,
        }
    }

    pub fn enabled(&self) -> Vec<Channel> {
        [Channel::Email, Channel::Chat, Channel::InApp]
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }
}

/// Per-severity deviation thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl SeverityThresholds {
    pub fn for_severity(&self, severity: AnomalySeverity) -> f64 {
        match severity {
            AnomalySeverity::Critical => self.critical,
            AnomalySeverity::High => self.high,
            AnomalySeverity::Medium => self.medium,
            AnomalySeverity::Low => self.low,
        }
    }
}

/// Per-severity notification toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyOn {
    pub critical: bool,
    pub high: bool,
    pub medium: bool,
    pub low: bool,
}

impl NotifyOn {
    pub fn for_severity(&self, severity: AnomalySeverity) -> bool {
        match severity {
            AnomalySeverity::Critical => self.critical,
            AnomalySeverity::High => self.high,
            AnomalySeverity::Medium => self.medium,
            AnomalySeverity::Low => self.low,
        }
    }
}

/// Per-user alerting configuration
///
/// Owned by the settings collaborator; read-only to this core. The
/// `Default` impl is the single source of the fallback applied when a user
/// has no stored configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    pub channels: ChannelSet,
    pub thresholds: SeverityThresholds,
    pub notify_on: NotifyOn,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            channels: ChannelSet {
                email: true,
                chat: false,
                in_app: true,
            },
            thresholds: SeverityThresholds {
                critical: 1.0,
                high: 0.5,
                medium: 0.3,
                low: 0.2,
            },
            notify_on: NotifyOn {
                critical: true,
                high: true,
                medium: false,
                low: false,
            },
        }
    }
}

/// What triggered an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    CostAnomaly,
}

/// Terminal-state lifecycle of an alert
///
/// One-way transitions only: pending -> sent or pending -> failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Sent,
    Failed,
}

impl AlertStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// An alert awaiting (or past) channel dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub user_id: String,
    pub kind: AlertKind,
    pub severity: AnomalySeverity,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Build a pending cost-anomaly alert for a user
    pub fn from_anomaly(user_id: impl Into<String>, anomaly: &Anomaly) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(
            "dimension".to_string(),
            serde_json::Value::String(anomaly.dimension.to_string()),
        );
        metadata.insert("anomalyId".to_string(), serde_json::json!(anomaly.id));
        metadata.insert("deviation".to_string(), serde_json::json!(anomaly.deviation));
        metadata.insert(
            "rootCause".to_string(),
            serde_json::json!(anomaly.root_cause),
        );

        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            kind: AlertKind::CostAnomaly,
            severity: anomaly.severity,
            title: format!(
                "{} cost anomaly: {}",
                anomaly.severity, anomaly.dimension
            ),
            message: format!(
                "Cost for {} is {:.2} against an expected {:.2} ({:+.0}% deviation). Likely cause: {}.",
                anomaly.dimension,
                anomaly.actual_cost,
                anomaly.expected_cost,
                anomaly.deviation * 100.0 * (anomaly.actual_cost - anomaly.expected_cost).signum(),
                anomaly.root_cause
            ),
            metadata,
            status: AlertStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::anomaly::{AnomalyStatus, RootCause};
    use crate::models::record::DimensionKey;

    #[test]
    fn test_default_config_matches_platform_fallback() {
        let config = AlertConfig::default();

        assert!(config.channels.email);
        assert!(!config.channels.chat);
        assert!(config.channels.in_app);

        assert_eq!(config.thresholds.critical, 1.0);
        assert_eq!(config.thresholds.high, 0.5);
        assert_eq!(config.thresholds.medium, 0.3);
        assert_eq!(config.thresholds.low, 0.2);

        assert!(config.notify_on.critical);
        assert!(config.notify_on.high);
        assert!(!config.notify_on.medium);
        assert!(!config.notify_on.low);
    }

    #[test]
    fn test_enabled_channels_respect_toggles() {
        let channels = ChannelSet {
            email: true,
            chat: true,
            in_app: false,
        };
        assert_eq!(channels.enabled(), vec![Channel::Email, Channel::Chat]);
    }

    #[test]
    fn test_alert_from_anomaly_starts_pending() {
        let anomaly = Anomaly {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            dimension: DimensionKey::new("aws", "ec2", "default"),
            actual_cost: 200.0,
            expected_cost: 100.0,
            deviation: 1.0,
            severity: AnomalySeverity::High,
            root_cause: RootCause::DataTransferGrowth,
            status: AnomalyStatus::Active,
        };

        let alert = Alert::from_anomaly("user-1", &anomaly);
        assert_eq!(alert.status, AlertStatus::Pending);
        assert!(!alert.status.is_terminal());
        assert_eq!(alert.severity, AnomalySeverity::High);
        assert!(alert.title.contains("aws/ec2/default"));
        assert!(alert.metadata.contains_key("rootCause"));
    }
}
