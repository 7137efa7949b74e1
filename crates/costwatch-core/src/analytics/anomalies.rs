//! Anomaly detection over analyzed cost patterns
//!
//! Flags series whose deviation from the expected-cost baseline exceeds the
//! configured threshold, classifies severity, and attributes a root cause
//! with a deterministic scoring function.

use chrono::Utc;
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::config::DetectorConfig;
use crate::error::CoreError;
use crate::models::anomaly::{Anomaly, AnomalySeverity, AnomalyStatus, RootCause};
use crate::models::pattern::{CostPattern, Trend};

/// Causal-factor catalog with base weights
///
/// Order doubles as the tie-break: earlier entries win equal scores.
static ROOT_CAUSE_CATALOG: Lazy<Vec<(RootCause, f64)>> = Lazy::new(|| {
    vec![
        (RootCause::UntaggedResources, 1.2),
        (RootCause::UnusualUsage, 1.0),
        (RootCause::Misconfiguration, 1.1),
        (RootCause::ProviderPriceChange, 0.9),
        (RootCause::DataTransferGrowth, 1.0),
    ]
});

/// Anomaly detector
///
/// Synchronous and CPU-bound; persistence of the detected batch is the
/// pipeline's responsibility.
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: DetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect anomalies across one run's patterns
    ///
    /// Fails with `NoData` when the pattern set is empty: no history means
    /// no baseline, and a fabricated anomaly would be worse than an error.
    /// Series with a zero expected cost are excluded (division guard) and
    /// logged, not fatal.
    ///
    /// Returns anomalies sorted most-severe first, then by deviation.
    pub fn detect(&self, patterns: &[CostPattern]) -> Result<Vec<Anomaly>, CoreError> {
        if patterns.is_empty() {
            return Err(CoreError::no_data(
                "no cost patterns for the requested window",
            ));
        }

        let threshold = self.config.effective_threshold();
        let now = Utc::now();
        let mut anomalies = Vec::new();

        for pattern in patterns {
            let Some(deviation) = pattern.deviation() else {
                tracing::warn!(
                    dimension = %pattern.dimension,
                    "zero expected cost, excluding series from detection"
                );
                continue;
            };

            if deviation <= threshold {
                continue;
            }

            anomalies.push(Anomaly {
                id: Uuid::new_v4(),
                timestamp: now,
                dimension: pattern.dimension.clone(),
                actual_cost: pattern.actual_cost,
                expected_cost: pattern.expected_cost,
                deviation,
                severity: AnomalySeverity::from_deviation(deviation),
                root_cause: classify_root_cause(pattern, deviation),
                status: AnomalyStatus::Active,
            });
        }

        anomalies.sort_by(|a, b| {
            b.severity.cmp(&a.severity).then(
                b.deviation
                    .partial_cmp(&a.deviation)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        Ok(anomalies)
    }
}

/// Attribute a root cause from the pattern's own signals
///
/// Each catalog factor scores on the signals it explains (untagged-bucket
/// membership, seasonality, deviation magnitude, trend direction), scaled
/// by its catalog weight. Deterministic: identical patterns always yield
/// identical causes, ties resolved by catalog order.
pub fn classify_root_cause(pattern: &CostPattern, deviation: f64) -> RootCause {
    let mut best = ROOT_CAUSE_CATALOG[0].0;
    let mut best_score = f64::MIN;

    for (cause, weight) in ROOT_CAUSE_CATALOG.iter() {
        let signal = match cause {
            // Spend growing in the untagged bucket points at untracked resources
            RootCause::UntaggedResources => {
                if pattern.dimension.is_default_project() {
                    0.8 + deviation.min(1.0) * 0.2
                } else {
                    0.0
                }
            }
            // A noisy weekday profile marks irregular consumption
            RootCause::UnusualUsage => match pattern.seasonality {
                Some(s) => 0.5 + (s.amplitude / 10.0).min(0.5),
                None => {
                    if pattern.trend == Trend::Stable {
                        0.3
                    } else {
                        0.1
                    }
                }
            },
            // Extreme deviation without a growth trend smells like a config change
            RootCause::Misconfiguration => {
                if deviation > 1.0 && pattern.trend != Trend::Increasing {
                    0.9
                } else if deviation > 1.0 {
                    0.4
                } else {
                    0.0
                }
            }
            // A uniform shift on a stable series fits a unit-price change
            RootCause::ProviderPriceChange => {
                if pattern.trend == Trend::Stable && deviation <= 0.5 {
                    0.7
                } else {
                    0.1
                }
            }
            // Sustained growth is the classic egress-cost signature
            RootCause::DataTransferGrowth => {
                if pattern.trend == Trend::Increasing {
                    0.6 + deviation.min(1.0) * 0.3
                } else {
                    0.0
                }
            }
        };

        let score = signal * weight;
        if score > best_score {
            best_score = score;
            best = *cause;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Sensitivity;
    use crate::models::pattern::{Seasonality, SeasonalityPeriod};
    use crate::models::record::DimensionKey;

    fn pattern(actual: f64, expected: f64, trend: Trend, project: &str) -> CostPattern {
        CostPattern {
            dimension: DimensionKey::new("aws", "ec2", project),
            actual_cost: actual,
            expected_cost: expected,
            trend,
            seasonality: None,
        }
    }

    #[test]
    fn test_empty_patterns_is_no_data() {
        let detector = AnomalyDetector::default();
        assert!(matches!(
            detector.detect(&[]),
            Err(CoreError::NoData { .. })
        ));
    }

    #[test]
    fn test_below_threshold_emits_nothing() {
        let detector = AnomalyDetector::default();
        // deviation 0.2, default threshold 0.3
        let patterns = vec![pattern(120.0, 100.0, Trend::Stable, "web")];
        assert!(detector.detect(&patterns).unwrap().is_empty());
    }

    #[test]
    fn test_above_threshold_emits_active_anomaly() {
        let detector = AnomalyDetector::default();
        let patterns = vec![pattern(200.0, 100.0, Trend::Increasing, "web")];

        let anomalies = detector.detect(&patterns).unwrap();
        assert_eq!(anomalies.len(), 1);

        let anomaly = &anomalies[0];
        assert_eq!(anomaly.status, AnomalyStatus::Active);
        assert!((anomaly.deviation - 1.0).abs() < f64::EPSILON);
        assert_eq!(anomaly.severity, AnomalySeverity::High);
    }

    #[test]
    fn test_zero_expected_cost_excluded() {
        let detector = AnomalyDetector::default();
        let patterns = vec![
            pattern(100.0, 0.0, Trend::Stable, "web"),
            pattern(200.0, 100.0, Trend::Stable, "web"),
        ];

        let anomalies = detector.detect(&patterns).unwrap();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].expected_cost, 100.0);
    }

    #[test]
    fn test_sensitivity_widens_detection() {
        // deviation 0.25: invisible at medium (0.3), flagged at high (0.2)
        let patterns = vec![pattern(125.0, 100.0, Trend::Stable, "web")];

        let medium = AnomalyDetector::default();
        assert!(medium.detect(&patterns).unwrap().is_empty());

        let high = AnomalyDetector::new(DetectorConfig::with_sensitivity(Sensitivity::High));
        assert_eq!(high.detect(&patterns).unwrap().len(), 1);
    }

    #[test]
    fn test_explicit_threshold_override() {
        let patterns = vec![pattern(115.0, 100.0, Trend::Stable, "web")];
        let detector = AnomalyDetector::new(DetectorConfig::with_threshold(0.1));
        assert_eq!(detector.detect(&patterns).unwrap().len(), 1);
    }

    #[test]
    fn test_sorted_most_severe_first() {
        let detector = AnomalyDetector::default();
        let patterns = vec![
            pattern(140.0, 100.0, Trend::Stable, "web"), // medium
            pattern(300.0, 100.0, Trend::Stable, "web"), // critical
            pattern(170.0, 100.0, Trend::Stable, "web"), // high
        ];

        let anomalies = detector.detect(&patterns).unwrap();
        let severities: Vec<_> = anomalies.iter().map(|a| a.severity).collect();
        assert_eq!(
            severities,
            vec![
                AnomalySeverity::Critical,
                AnomalySeverity::High,
                AnomalySeverity::Medium
            ]
        );
    }

    #[test]
    fn test_root_cause_is_deterministic() {
        let p = pattern(200.0, 100.0, Trend::Increasing, "web");
        let first = classify_root_cause(&p, 1.0);
        for _ in 0..10 {
            assert_eq!(classify_root_cause(&p, 1.0), first);
        }
    }

    #[test]
    fn test_untagged_bucket_attributed_to_untagged_resources() {
        let p = pattern(200.0, 100.0, Trend::Increasing, "default");
        assert_eq!(classify_root_cause(&p, 1.0), RootCause::UntaggedResources);
    }

    #[test]
    fn test_growth_trend_attributed_to_data_transfer() {
        let p = pattern(200.0, 100.0, Trend::Increasing, "web");
        assert_eq!(classify_root_cause(&p, 1.0), RootCause::DataTransferGrowth);
    }

    #[test]
    fn test_extreme_spike_without_growth_is_misconfiguration() {
        let p = pattern(500.0, 100.0, Trend::Stable, "web");
        assert_eq!(classify_root_cause(&p, 4.0), RootCause::Misconfiguration);
    }

    #[test]
    fn test_uniform_shift_on_stable_series_is_price_change() {
        let p = pattern(135.0, 100.0, Trend::Stable, "web");
        assert_eq!(
            classify_root_cause(&p, 0.35),
            RootCause::ProviderPriceChange
        );
    }

    #[test]
    fn test_seasonal_series_is_unusual_usage() {
        let mut p = pattern(160.0, 100.0, Trend::Stable, "web");
        p.seasonality = Some(Seasonality {
            period: SeasonalityPeriod::Daily,
            amplitude: 8.0,
        });
        assert_eq!(classify_root_cause(&p, 0.6), RootCause::UnusualUsage);
    }
}
