//! Forecast entries and what-if simulation inputs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One forecast day: point prediction plus confidence bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub date: NaiveDate,
    pub predicted_cost: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
}

/// Optional simulation adjustments applied multiplicatively to the forecast
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    /// Planned new deployments, each scaling cost by the configured
    /// deployment-impact coefficient
    pub new_deployments: u32,
    /// Expected organic growth in percent, >= 0
    pub expected_growth_percent: f64,
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.expected_growth_percent.is_finite() || self.expected_growth_percent < 0.0 {
            return Err(CoreError::validation(format!(
                "expected_growth_percent must be a non-negative number, got {}",
                self.expected_growth_percent
            )));
        }
        Ok(())
    }
}
