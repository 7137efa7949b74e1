//! Cost analytics pipeline
//!
//! Turns raw cost records into per-dimension patterns, anomalies, and
//! forecasts: group -> analyze -> detect -> forecast.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub mod anomalies;
pub mod forecasting;
pub mod grouping;
pub mod patterns;


pub use anomalies::{classify_root_cause, AnomalyDetector};
pub use forecasting::{aggregate_daily, forecast_series};
pub use grouping::group_by_dimension;
pub use patterns::{analyze_patterns, analyze_series};

use crate::config::{DetectorConfig, ForecastConfig};
use crate::error::CoreError;
use crate::event::{DataEvent, EventBus};
use crate::models::anomaly::Anomaly;
use crate::models::forecast::{Forecast, SimulationParams};
use crate::models::pattern::CostPattern;
use crate::models::record::{CostRecord, DimensionKey, TimeWindow};
use crate::store::{AnomalyStore, BillingStore};

/// Complete output of one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    /// One pattern per non-empty series
    pub patterns: Vec<CostPattern>,
    /// Detected anomalies, most severe first
    pub anomalies: Vec<Anomaly>,
    /// Per-dimension forecasts; series with <2 distinct days are absent
    pub forecasts: BTreeMap<DimensionKey, Vec<Forecast>>,
    /// Timestamp of computation
    pub computed_at: DateTime<Utc>,
}

/// Pipeline façade wiring detector and forecast configuration
///
/// Stores are injected per call so tests substitute in-memory fakes.
pub struct AnalysisEngine {
    detector: AnomalyDetector,
    forecast_config: ForecastConfig,
    events: EventBus,
}

impl AnalysisEngine {
    pub fn new(detector_config: DetectorConfig, forecast_config: ForecastConfig) -> Self {
        Self {
            detector: AnomalyDetector::new(detector_config),
            forecast_config,
            events: EventBus::default_capacity(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default(), ForecastConfig::default())
    }

    /// Subscribe to pipeline events
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run the CPU-bound pipeline over already-fetched records
    ///
    /// Synchronous: grouping, pattern analysis, detection, and forecasting
    /// never suspend. Fails with `NoData` when there are no records.
    pub fn compute(
        &self,
        records: &[CostRecord],
        simulation: Option<&SimulationParams>,
    ) -> Result<AnalysisRun, CoreError> {
        let series = group_by_dimension(records);
        let patterns = analyze_patterns(&series);
        let anomalies = self.detector.detect(&patterns)?;

        let mut forecasts = BTreeMap::new();
        for (dimension, records) in &series {
            let forecast = forecast_series(records, simulation, &self.forecast_config)?;
            if !forecast.is_empty() {
                forecasts.insert(dimension.clone(), forecast);
            }
        }

        tracing::debug!(
            series = series.len(),
            anomalies = anomalies.len(),
            forecasted = forecasts.len(),
            "analysis run computed"
        );

        Ok(AnalysisRun {
            patterns,
            anomalies,
            forecasts,
            computed_at: Utc::now(),
        })
    }

    /// Fetch, compute, and persist one full run for a user
    ///
    /// Detected anomalies are saved in one batch; a persistence failure is
    /// fatal to the run and propagates.
    pub async fn run(
        &self,
        user_id: &str,
        window: TimeWindow,
        billing: &dyn BillingStore,
        anomaly_store: &dyn AnomalyStore,
        simulation: Option<&SimulationParams>,
    ) -> Result<AnalysisRun, CoreError> {
        let records = billing.fetch_cost_records(user_id, None, window).await?;
        let run = self.compute(&records, simulation)?;

        anomaly_store.save_anomalies(user_id, &run.anomalies).await?;

        for anomaly in &run.anomalies {
            self.events.publish(DataEvent::AnomalyDetected(anomaly.id));
        }
        self.events.publish(DataEvent::AnalysisCompleted {
            anomaly_count: run.anomalies.len(),
        });

        Ok(run)
    }
}
