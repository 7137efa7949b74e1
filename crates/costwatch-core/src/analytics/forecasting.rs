//! Cost forecasting with geometric growth extrapolation
//!
//! Aggregates a series into daily totals, fits a geometric daily growth
//! rate between the first and last observed day, and extrapolates over a
//! fixed horizon with a 1.96-sigma confidence band.
//!
//! The band is derived from the historical daily-cost standard deviation
//! and is deliberately the same width for every horizon day; it does not
//! widen with forecast distance.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::config::ForecastConfig;
use crate::error::CoreError;
use crate::models::forecast::{Forecast, SimulationParams};
use crate::models::record::CostRecord;

/// Sum record amounts into per-day totals
pub fn aggregate_daily(records: &[CostRecord]) -> BTreeMap<NaiveDate, f64> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *daily.entry(record.timestamp.date_naive()).or_default() += record.amount;
    }
    daily
}

/// Forecast a single series over the configured horizon
///
/// Requires at least 2 distinct days of history; thinner series yield an
/// empty forecast (not an error). Simulation adjustments scale every
/// horizon day multiplicatively. Entries start the day after the last
/// historical day.
pub fn forecast_series(
    records: &[CostRecord],
    simulation: Option<&SimulationParams>,
    config: &ForecastConfig,
) -> Result<Vec<Forecast>, CoreError> {
    if let Some(sim) = simulation {
        sim.validate()?;
    }

    let daily = aggregate_daily(records);
    if daily.len() < 2 {
        tracing::debug!(days = daily.len(), "fewer than 2 distinct days, skipping forecast");
        return Ok(Vec::new());
    }

    let costs: Vec<f64> = daily.values().copied().collect();
    let Some((&last_day, &last)) = daily.iter().next_back() else {
        return Ok(Vec::new());
    };
    let first = costs[0];

    // Geometric daily rate solving last = first * (1+r)^(n-1). Undefined
    // when the first day cost is zero; extrapolate flat from the last cost.
    let growth_rate = if first > 0.0 {
        (last / first).powf(1.0 / (costs.len() as f64 - 1.0)) - 1.0
    } else {
        0.0
    };

    let adjustment = simulation.map_or(1.0, |sim| {
        (1.0 + f64::from(sim.new_deployments) * config.deployment_impact)
            * (1.0 + sim.expected_growth_percent / 100.0)
    });

    let band = config.confidence_z * stddev(&costs);

    let forecasts = (1..=i64::from(config.horizon_days))
        .map(|i| {
            let predicted = last * (1.0 + growth_rate).powi(i as i32) * adjustment;
            Forecast {
                date: last_day + chrono::Duration::days(i),
                predicted_cost: predicted,
                // A cost cannot go negative
                confidence_low: (predicted - band).max(0.0),
                confidence_high: predicted + band,
            }
        })
        .collect();

    Ok(forecasts)
}

/// Population standard deviation
fn stddev(values: &[f64]) -> f64 {
    super::patterns::variance(values).sqrt()
}
