//! Output formatting and persistence for deviation reports.
//!
//! Supports pretty-printing, JSON files, and CSV append of per-source scores.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::LocationDeviationReport;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One CSV row: a source's score at one location.
#[derive(Debug, Serialize)]
pub struct ScoreRow<'a> {
    pub timestamp: DateTime<Utc>,
    pub location: &'a str,
    pub source: &'a str,
    pub score: f64,
    pub max_temp_dev: Option<f64>,
    pub min_temp_dev: Option<f64>,
    pub pop_dev: Option<f64>,
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON under a heading.
pub fn print_json(heading: &str, value: &impl Serialize) -> Result<()> {
    info!("===== {} =====\n{}", heading, serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value to `path` as pretty-printed JSON, replacing the file.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("writing {path}"))?;
    debug!(path, "JSON written");
    Ok(())
}

/// Appends one row per scored source to a CSV file.
///
/// Writes the header row when the file is missing or empty.
pub fn append_scores(path: &str, location: &str, report: &LocationDeviationReport) -> Result<()> {
    let has_rows = Path::new(path)
        .metadata()
        .map(|m| m.len() > 0)
        .unwrap_or(false);
    debug!(path, has_rows, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_rows) // IMPORTANT when appending
        .from_writer(file);

    let timestamp = Utc::now();
    for (source, dev) in &report.sources {
        writer.serialize(ScoreRow {
            timestamp,
            location,
            source,
            score: dev.score,
            max_temp_dev: dev.details.max_temp,
            min_temp_dev: dev.details.min_temp,
            pop_dev: dev.details.pop,
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::compare::compare;
    use crate::forecast::NormalizedForecast;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn report() -> LocationDeviationReport {
        let f = |source: &str, max: f64| NormalizedForecast {
            source: source.to_string(),
            max_temp: Some(max),
            min_temp: None,
            pop: Some(30),
            description: None,
        };
        compare(&[f("A", 10.0), f("B", 12.0), f("C", 14.0)])
    }

    #[test]
    fn test_print_pretty_location_report() {
        let raw = vec![
            crate::forecast::RawForecast::new("A").with_max_temp(10.0),
            crate::forecast::RawForecast::new("B").with_max_temp(12.0),
        ];
        let location = crate::locations::default_location();
        print_pretty(&crate::pipeline::score_raw(&location.key(), location, raw));
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json("scores", &report()).unwrap();
    }

    #[test]
    fn test_write_json_round_trips() {
        let path = temp_path("forecast_consensus_test_report.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &report()).unwrap();
        let back: LocationDeviationReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_scores_writes_header_once() {
        let path = temp_path("forecast_consensus_test_header.csv");
        let _ = fs::remove_file(&path);

        append_scores(&path, "千葉県_千葉市", &report()).unwrap();
        append_scores(&path, "千葉県_千葉市", &report()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 appends of 3 sources
        assert_eq!(content.lines().count(), 7);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_scores_writes_header_into_empty_file() {
        let path = temp_path("forecast_consensus_test_empty.csv");
        fs::write(&path, "").unwrap();

        append_scores(&path, "千葉県_千葉市", &report()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,location,source,score"));
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_scores_row_contents() {
        let path = temp_path("forecast_consensus_test_rows.csv");
        let _ = fs::remove_file(&path);

        append_scores(&path, "here", &report()).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "timestamp",
                "location",
                "source",
                "score",
                "max_temp_dev",
                "min_temp_dev",
                "pop_dev"
            ]
        );
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][2], "A");
        assert_eq!(&rows[0][3], "2.0");
        assert_eq!(&rows[0][5], "");

        fs::remove_file(&path).unwrap();
    }
}
