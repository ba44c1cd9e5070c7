//! Snapshot export to JSON and CSV.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{Terminator, WriterBuilder};
use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::{ExportError, Result};
use crate::mental_health::MentalHealthSnapshot;

/// CSV header, one column per trend point attribute.
pub const CSV_HEADERS: [&str; 7] = [
    "Year",
    "Cases",
    "Change",
    "Trend",
    "Moving Average",
    "Volatility",
    "Seasonality",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "mental-health-data.json",
            ExportFormat::Csv => "mental-health-data.csv",
        }
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Pretty-printed JSON of the whole snapshot.
pub fn to_json(snapshot: &MentalHealthSnapshot) -> std::result::Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// CSV of the snapshot's trend points, one row per point in order.
///
/// Absent values are written as empty fields.
pub fn to_csv(snapshot: &MentalHealthSnapshot) -> std::result::Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for point in &snapshot.trends {
        writer.write_record([
            point.period.clone(),
            point.value.to_string(),
            optional(point.change_pct),
            optional(point.trend),
            optional(point.moving_average),
            optional(point.volatility),
            optional(point.seasonality),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write the snapshot to `dir` in the given format and return the file path.
///
/// The directory is created if needed; an existing export is overwritten.
pub fn export_data(
    snapshot: &MentalHealthSnapshot,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf> {
    let contents = match format {
        ExportFormat::Json => to_json(snapshot)?,
        ExportFormat::Csv => to_csv(snapshot)?,
    };

    fs::create_dir_all(dir).map_err(ExportError::from)?;
    let path = dir.join(format.file_name());
    fs::write(&path, contents).map_err(ExportError::from)?;

    info!("Exported mental health data to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mental_health::fallback::fallback_snapshot;
    use crate::mental_health::{Trend, TrendPoint};
    use chrono::Utc;

    #[test]
    fn test_csv_header_and_rows_in_order() {
        let snapshot = fallback_snapshot(Utc::now());

        let csv = to_csv(&snapshot).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "Year,Cases,Change,Trend,Moving Average,Volatility,Seasonality"
        );
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "2019,20,,,,,");
        assert_eq!(lines[2], "2020,25,25,up,22.5,2.5,0.1");
        assert_eq!(lines[4], "2022,28,-6.7,down,27.7,2.3,0.12");
    }

    #[test]
    fn test_csv_without_trends_is_header_only() {
        let mut snapshot = fallback_snapshot(Utc::now());
        snapshot.trends.clear();

        let csv = to_csv(&snapshot).unwrap();
        assert_eq!(
            csv,
            "Year,Cases,Change,Trend,Moving Average,Volatility,Seasonality\n"
        );
    }

    #[test]
    fn test_csv_partial_point() {
        let mut snapshot = fallback_snapshot(Utc::now());
        snapshot.trends = vec![TrendPoint {
            trend: Some(Trend::Stable),
            change_pct: Some(0.5),
            ..TrendPoint::new("2023-Q1", 12.0)
        }];

        let csv = to_csv(&snapshot).unwrap();
        assert_eq!(csv.lines().nth(1), Some("2023-Q1,12,0.5,stable,,,"));
    }

    #[test]
    fn test_json_round_trips_snapshot() {
        let snapshot = fallback_snapshot(Utc::now());

        let json = to_json(&snapshot).unwrap();
        assert!(json.contains("\"economicImpact\": 51.0"));
        assert!(json.contains("\"supportAvailability\": \"24/7\""));

        let parsed: MentalHealthSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_export_writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = fallback_snapshot(Utc::now());

        let json_path = export_data(&snapshot, ExportFormat::Json, dir.path()).unwrap();
        let csv_path = export_data(&snapshot, ExportFormat::Csv, dir.path()).unwrap();

        assert_eq!(json_path, dir.path().join("mental-health-data.json"));
        assert_eq!(csv_path, dir.path().join("mental-health-data.csv"));
        assert_eq!(fs::read_to_string(&csv_path).unwrap(), to_csv(&snapshot).unwrap());
        assert!(fs::read_to_string(&json_path).unwrap().starts_with('{'));
    }

    #[test]
    fn test_export_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let err = export_data(&fallback_snapshot(Utc::now()), ExportFormat::Json, &blocker)
            .unwrap_err();
        assert!(matches!(err, crate::Error::Export(ExportError::Io(_))), "{:?}", err);
    }

    #[test]
    fn test_export_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("exports").join("latest");

        let path = export_data(&fallback_snapshot(Utc::now()), ExportFormat::Csv, &nested).unwrap();
        assert!(path.exists());
    }
}
