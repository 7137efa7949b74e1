//! costwatch-core - Core library for costwatch
//!
//! Cost-telemetry analytics for a multi-cloud cost-management platform:
//! series grouping, pattern analysis, anomaly detection, forecasting, and
//! alert dispatch.

pub mod analytics;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod models;
pub mod store;

pub use analytics::{AnalysisEngine, AnalysisRun, AnomalyDetector};
pub use config::{DetectorConfig, ForecastConfig, Sensitivity};
pub use dispatch::{AlertDispatcher, DispatchOutcome, DispatchReport};
pub use error::{CoreError, DeliveryError};
pub use event::{DataEvent, EventBus};
pub use store::MemoryStore;
