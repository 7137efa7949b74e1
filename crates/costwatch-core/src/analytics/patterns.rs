//! Cost pattern analysis
//!
//! Per-series expected-cost baseline (trailing moving average), trend
//! classification (half-split mean comparison), and day-of-week seasonality
//! detection via bucket-variance comparison.

use chrono::Datelike;
use std::collections::BTreeMap;

use crate::models::pattern::{CostPattern, Seasonality, SeasonalityPeriod, Trend};
use crate::models::record::{CostRecord, DimensionKey};

/// Trailing window for the expected-cost moving average
const MOVING_AVERAGE_WINDOW: usize = 7;

/// |change| below this ratio classifies as stable
const STABLE_BAND: f64 = 0.10;

/// Minimum series length before seasonality is evaluated
const SEASONALITY_MIN_POINTS: usize = 30;

/// Max bucket variance must exceed the mean variance by this factor
const SEASONALITY_VARIANCE_RATIO: f64 = 2.0;

/// Analyze every series in a grouped record map
///
/// Empty series are skipped with a warning; they carry no signal.
pub fn analyze_patterns(series: &BTreeMap<DimensionKey, Vec<CostRecord>>) -> Vec<CostPattern> {
    series
        .iter()
        .filter_map(|(dimension, records)| {
            let pattern = analyze_series(dimension, records);
            if pattern.is_none() {
                tracing::warn!(dimension = %dimension, "empty series, skipping pattern analysis");
            }
            pattern
        })
        .collect()
}

/// Analyze a single time-sorted series
///
/// Returns `None` for an empty series. The "actual" cost is the most
/// recent record's amount.
pub fn analyze_series(dimension: &DimensionKey, records: &[CostRecord]) -> Option<CostPattern> {
    let actual_cost = records.last()?.amount;
    let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();

    Some(CostPattern {
        dimension: dimension.clone(),
        actual_cost,
        expected_cost: expected_cost(&amounts),
        trend: classify_trend(&amounts),
        seasonality: detect_seasonality(records),
    })
}

/// Trailing moving average with window 7
///
/// Short series average over all available points instead of failing.
fn expected_cost(amounts: &[f64]) -> f64 {
    let window = amounts.len().min(MOVING_AVERAGE_WINDOW);
    let tail = &amounts[amounts.len() - window..];
    tail.iter().sum::<f64>() / window as f64
}

/// Classify trend by comparing the means of the two index halves
///
/// `change = (second_mean - first_mean) / first_mean`; within ±10% is
/// stable. Fewer than 2 points is stable. A zero first-half mean leaves
/// the ratio undefined: increasing when the second half spends, stable
/// otherwise.
fn classify_trend(amounts: &[f64]) -> Trend {
    if amounts.len() < 2 {
        return Trend::Stable;
    }

    let mid = amounts.len() / 2;
    let first_mean = mean(&amounts[..mid]);
    let second_mean = mean(&amounts[mid..]);

    if first_mean == 0.0 {
        return if second_mean > 0.0 {
            Trend::Increasing
        } else {
            Trend::Stable
        };
    }

    let change = (second_mean - first_mean) / first_mean;
    if change.abs() < STABLE_BAND {
        Trend::Stable
    } else if change > 0.0 {
        Trend::Increasing
    } else {
        Trend::Decreasing
    }
}

/// Detect a day-of-week seasonal pattern
///
/// Buckets costs by weekday and compares the loudest bucket's variance to
/// the mean variance across non-empty buckets. Only evaluated for series
/// with at least 30 points.
fn detect_seasonality(records: &[CostRecord]) -> Option<Seasonality> {
    if records.len() < SEASONALITY_MIN_POINTS {
        return None;
    }

    let mut buckets: [Vec<f64>; 7] = Default::default();
    for record in records {
        let weekday = record.timestamp.weekday().num_days_from_monday() as usize;
        buckets[weekday].push(record.amount);
    }

    let variances: Vec<f64> = buckets
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| variance(b))
        .collect();

    let mean_variance = mean(&variances);
    if mean_variance == 0.0 {
        return None;
    }

    let max_variance = variances.iter().cloned().fold(0.0, f64::max);
    if max_variance > SEASONALITY_VARIANCE_RATIO * mean_variance {
        Some(Seasonality {
            period: SeasonalityPeriod::Daily,
            amplitude: max_variance / mean_variance,
        })
    } else {
        None
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}
