//! CLI helpers: record loading, argument parsing, table formatting

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::path::Path;

use costwatch_core::config::Sensitivity;
use costwatch_core::dispatch::DispatchReport;
use costwatch_core::models::alert::{Alert, AlertStatus};
use costwatch_core::models::anomaly::{Anomaly, AnomalySeverity};
use costwatch_core::models::forecast::Forecast;
use costwatch_core::models::record::{CostRecord, DimensionKey};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    EmptyRecords { path: String },
    UnknownSensitivity { value: String },
    UnknownDimension { dimension: String, available: Vec<String> },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::EmptyRecords { path } => {
                write!(f, "No cost records found in '{}'", path)
            }
            CliError::UnknownSensitivity { value } => {
                write!(
                    f,
                    "Unknown sensitivity '{}' (expected: low, medium, high)",
                    value
                )
            }
            CliError::UnknownDimension {
                dimension,
                available,
            } => {
                write!(
                    f,
                    "No series matches dimension '{}'. Available:\n{}",
                    dimension,
                    available
                        .iter()
                        .map(|d| format!("  - {}", d))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            }
        }
    }
}

impl std::error::Error for CliError {}

// ============================================================================
// Input Parsing
// ============================================================================

/// Load cost records from a JSON array file
pub fn load_records(path: &Path) -> Result<Vec<CostRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    let records: Vec<CostRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid records JSON in {}", path.display()))?;

    if records.is_empty() {
        return Err(CliError::EmptyRecords {
            path: path.display().to_string(),
        }
        .into());
    }

    Ok(records)
}

/// Parse a sensitivity flag value
pub fn parse_sensitivity(value: &str) -> Result<Sensitivity, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "low" => Ok(Sensitivity::Low),
        "medium" => Ok(Sensitivity::Medium),
        "high" => Ok(Sensitivity::High),
        _ => Err(CliError::UnknownSensitivity {
            value: value.to_string(),
        }),
    }
}

/// Parse "provider/service/project" into a dimension key
pub fn parse_dimension(value: &str) -> Option<DimensionKey> {
    let mut parts = value.splitn(3, '/');
    Some(DimensionKey::new(parts.next()?, parts.next()?, parts.next()?))
}

// ============================================================================
// Table Formatting
// ============================================================================

fn severity_color(severity: AnomalySeverity) -> Color {
    match severity {
        AnomalySeverity::Critical => Color::Red,
        AnomalySeverity::High => Color::Yellow,
        AnomalySeverity::Medium => Color::Cyan,
        AnomalySeverity::Low => Color::Grey,
    }
}

/// Format detected anomalies as a table
pub fn format_anomaly_table(anomalies: &[Anomaly], no_color: bool) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Severity",
            "Dimension",
            "Actual",
            "Expected",
            "Deviation",
            "Root Cause",
        ]);

    for anomaly in anomalies {
        let severity_cell = if no_color {
            Cell::new(anomaly.severity.label())
        } else {
            Cell::new(anomaly.severity.label()).fg(severity_color(anomaly.severity))
        };

        table.add_row(vec![
            severity_cell,
            Cell::new(anomaly.dimension.to_string()),
            Cell::new(format!("{:.2}", anomaly.actual_cost)),
            Cell::new(format!("{:.2}", anomaly.expected_cost)),
            Cell::new(format!("{:.0}%", anomaly.deviation * 100.0)),
            Cell::new(anomaly.root_cause.label()),
        ]);
    }

    table.to_string()
}

/// Format one series' forecast as a table
pub fn format_forecast_table(dimension: &DimensionKey, forecasts: &[Forecast]) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Predicted", "Low", "High"]);

    for forecast in forecasts {
        table.add_row(vec![
            Cell::new(forecast.date.to_string()),
            Cell::new(format!("{:.2}", forecast.predicted_cost)),
            Cell::new(format!("{:.2}", forecast.confidence_low)),
            Cell::new(format!("{:.2}", forecast.confidence_high)),
        ]);
    }

    format!("{}\n{}", dimension, table)
}

/// Format dispatch results as a table
pub fn format_dispatch_table(results: &[(Alert, Option<DispatchReport>)]) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Alert", "Severity", "Status", "Channels"]);

    for (alert, report) in results {
        let channels = match report {
            Some(report) => format!("{} sent, {} failed", report.succeeded(), report.failed()),
            None => "suppressed".to_string(),
        };
        let status = match alert.status {
            AlertStatus::Pending => "pending",
            AlertStatus::Sent => "sent",
            AlertStatus::Failed => "failed",
        };

        table.add_row(vec![
            Cell::new(&alert.title),
            Cell::new(alert.severity.label()),
            Cell::new(status),
            Cell::new(channels),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sensitivity_accepts_case_insensitive() {
        assert_eq!(parse_sensitivity("LOW").unwrap(), Sensitivity::Low);
        assert_eq!(parse_sensitivity("medium").unwrap(), Sensitivity::Medium);
        assert!(parse_sensitivity("extreme").is_err());
    }

    #[test]
    fn test_parse_dimension_roundtrip() {
        let key = parse_dimension("aws/ec2/web").unwrap();
        assert_eq!(key, DimensionKey::new("aws", "ec2", "web"));
        assert!(parse_dimension("aws/ec2").is_none());
    }
}
