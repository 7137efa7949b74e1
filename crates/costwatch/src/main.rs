//! costwatch - Multi-cloud cost anomaly detection and forecasting

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use costwatch_core::analytics::AnalysisEngine;
use costwatch_core::config::{DetectorConfig, ForecastConfig};
use costwatch_core::dispatch::{AlertDispatcher, DispatchOutcome, InAppSender};
use costwatch_core::models::alert::Alert;
use costwatch_core::models::forecast::SimulationParams;
use costwatch_core::models::record::{CostRecord, TimeWindow};
use costwatch_core::store::{MemoryStore, SettingsStore};

#[derive(Parser)]
#[command(
    name = "costwatch",
    version,
    about = "Multi-cloud cost anomaly detection and forecasting",
    long_about = "Analyzes per-resource cost records for anomalous spend and\n\
                  forecasts near-term cost per (provider, service, project) series.\n\
                  \n\
                  Examples:\n\
                    costwatch analyze records.json               # Flag anomalies\n\
                    costwatch analyze records.json -s high       # More sensitive\n\
                    costwatch analyze records.json --alerts      # Also dispatch alerts\n\
                    costwatch forecast records.json              # 30-day forecast\n\
                    costwatch forecast records.json --growth 15  # Simulate 15% growth\n\
                  \n\
                  Environment Variables:\n\
                    COSTWATCH_NO_COLOR     # Disable ANSI colors (log-friendly)\n\
                    RUST_LOG               # Log filter (e.g. costwatch_core=debug)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "COSTWATCH_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Detect cost anomalies in a records file
    Analyze {
        /// Path to a JSON array of cost records
        records: PathBuf,
        /// Detection sensitivity: low, medium, high
        #[arg(long, short = 's')]
        sensitivity: Option<String>,
        /// Explicit deviation threshold (overrides sensitivity)
        #[arg(long)]
        threshold: Option<f64>,
        /// Build and dispatch alerts for detected anomalies
        #[arg(long)]
        alerts: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forecast per-series cost over the next 30 days
    Forecast {
        /// Path to a JSON array of cost records
        records: PathBuf,
        /// Simulated new deployments
        #[arg(long, default_value = "0")]
        deployments: u32,
        /// Simulated expected growth in percent
        #[arg(long, default_value = "0")]
        growth: f64,
        /// Only this dimension (provider/service/project)
        #[arg(long, short = 'd')]
        dimension: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let no_color = cli.no_color;

    match cli.command {
        Command::Analyze {
            records,
            sensitivity,
            threshold,
            alerts,
            json,
        } => run_analyze(records, sensitivity, threshold, alerts, json, no_color).await,
        Command::Forecast {
            records,
            deployments,
            growth,
            dimension,
            json,
        } => run_forecast(records, deployments, growth, dimension, json),
    }
}

/// Window spanning all loaded records
fn full_window(records: &[CostRecord]) -> TimeWindow {
    let start = records.iter().map(|r| r.timestamp).min().unwrap_or_default();
    let end = records.iter().map(|r| r.timestamp).max().unwrap_or_default();
    TimeWindow::new(start, end + chrono::Duration::seconds(1))
}

async fn run_analyze(
    path: PathBuf,
    sensitivity: Option<String>,
    threshold: Option<f64>,
    alerts: bool,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let records = cli::load_records(&path)?;

    let mut detector_config = DetectorConfig::default();
    if let Some(value) = sensitivity {
        detector_config.sensitivity = cli::parse_sensitivity(&value)?;
    }
    detector_config.threshold = threshold;

    let store = MemoryStore::new();
    store.insert_records("local", records.clone());

    let engine = AnalysisEngine::new(detector_config, ForecastConfig::default());
    let run = engine
        .run("local", full_window(&records), &store, &store, None)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run.anomalies)?);
    } else if run.anomalies.is_empty() {
        println!(
            "No anomalies across {} series ({} records analyzed).",
            run.patterns.len(),
            records.len()
        );
    } else {
        println!("{}", cli::format_anomaly_table(&run.anomalies, no_color));
        eprintln!(
            "\n{} anomalies across {} series ({} records analyzed)",
            run.anomalies.len(),
            run.patterns.len(),
            records.len()
        );
    }

    if alerts && !run.anomalies.is_empty() {
        let config = store.alert_config("local").await?;
        let in_app = Arc::new(InAppSender::new());
        let dispatcher = AlertDispatcher::new(vec![in_app]);

        let mut results = Vec::new();
        for anomaly in &run.anomalies {
            let mut alert = Alert::from_anomaly("local", anomaly);
            let outcome = dispatcher.dispatch(&mut alert, &config, &store).await?;
            let report = match outcome {
                DispatchOutcome::Delivered(report) => Some(report),
                DispatchOutcome::Suppressed => None,
            };
            results.push((alert, report));
        }

        println!("\n{}", cli::format_dispatch_table(&results));
    }

    Ok(())
}

fn run_forecast(
    path: PathBuf,
    deployments: u32,
    growth: f64,
    dimension: Option<String>,
    json: bool,
) -> Result<()> {
    let records = cli::load_records(&path)?;

    let simulation = SimulationParams {
        new_deployments: deployments,
        expected_growth_percent: growth,
    };

    let series = costwatch_core::analytics::group_by_dimension(&records);
    let config = ForecastConfig::default();

    let selected = match dimension.as_deref() {
        Some(value) => {
            let key = cli::parse_dimension(value).ok_or_else(|| cli::CliError::UnknownDimension {
                dimension: value.to_string(),
                available: series.keys().map(ToString::to_string).collect(),
            })?;
            if !series.contains_key(&key) {
                return Err(cli::CliError::UnknownDimension {
                    dimension: value.to_string(),
                    available: series.keys().map(ToString::to_string).collect(),
                }
                .into());
            }
            vec![key]
        }
        None => series.keys().cloned().collect(),
    };

    let mut printed = 0;
    for key in &selected {
        let forecasts =
            costwatch_core::analytics::forecast_series(&series[key], Some(&simulation), &config)?;
        if forecasts.is_empty() {
            tracing::warn!(dimension = %key, "fewer than 2 distinct days, no forecast");
            continue;
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&forecasts)?);
        } else {
            if printed > 0 {
                println!();
            }
            println!("{}", cli::format_forecast_table(key, &forecasts));
        }
        printed += 1;
    }

    if printed == 0 && !json {
        println!("No series has enough history to forecast (need 2+ distinct days).");
    }

    Ok(())
}
