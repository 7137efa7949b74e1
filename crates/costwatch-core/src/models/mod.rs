//! Data models for costwatch

pub mod alert;
pub mod anomaly;
pub mod forecast;
pub mod pattern;
pub mod record;

pub use alert::{Alert, AlertConfig, AlertKind, AlertStatus, Channel, ChannelSet, NotifyOn, SeverityThresholds};
pub use anomaly::{Anomaly, AnomalySeverity, AnomalyStatus, RootCause};
pub use forecast::{Forecast, SimulationParams};
pub use pattern::{CostPattern, Seasonality, SeasonalityPeriod, Trend};
pub use record::{CostRecord, DimensionKey, TimeWindow};
