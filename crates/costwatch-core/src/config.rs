//! Tunable configuration for detection and forecasting

/// Detection sensitivity presets
///
/// Lower deviation threshold = more sensitive detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sensitivity {
    /// Threshold 0.5
    Low,
    /// Threshold 0.3
    #[default]
    Medium,
    /// Threshold 0.2
    High,
}

impl Sensitivity {
    pub fn threshold(&self) -> f64 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 0.3,
            Self::High => 0.2,
        }
    }
}

/// Anomaly-detector configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectorConfig {
    pub sensitivity: Sensitivity,
    /// Explicit deviation threshold; overrides the sensitivity preset
    pub threshold: Option<f64>,
}

impl DetectorConfig {
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self {
            sensitivity,
            threshold: None,
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            sensitivity: Sensitivity::default(),
            threshold: Some(threshold),
        }
    }

    pub fn effective_threshold(&self) -> f64 {
        self.threshold.unwrap_or_else(|| self.sensitivity.threshold())
    }
}

/// Forecast-engine configuration
#[derive(Debug, Clone, Copy)]
pub struct ForecastConfig {
    /// Forecast horizon in days
    pub horizon_days: u32,
    /// Multiplicative cost impact per planned deployment
    pub deployment_impact: f64,
    /// Z-score for the confidence band (1.96 = 95%)
    pub confidence_z: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            deployment_impact: 0.05,
            confidence_z: 1.96,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitivity_thresholds() {
        assert_eq!(Sensitivity::Low.threshold(), 0.5);
        assert_eq!(Sensitivity::Medium.threshold(), 0.3);
        assert_eq!(Sensitivity::High.threshold(), 0.2);
    }

    #[test]
    fn test_explicit_threshold_overrides_sensitivity() {
        let config = DetectorConfig {
            sensitivity: Sensitivity::Low,
            threshold: Some(0.15),
        };
        assert_eq!(config.effective_threshold(), 0.15);

        let config = DetectorConfig::with_sensitivity(Sensitivity::High);
        assert_eq!(config.effective_threshold(), 0.2);
    }

    #[test]
    fn test_forecast_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.horizon_days, 30);
        assert_eq!(config.deployment_impact, 0.05);
        assert_eq!(config.confidence_z, 1.96);
    }
}
