//! CLI entry point for the forecast consensus tool.
//!
//! Provides subcommands for scoring one location live, scoring a whole
//! location list (with CSV/JSON/map output and optional S3 publishing), and
//! scoring a file of raw forecasts offline.

mod infra;
mod services;

use crate::infra::llm::LlmArbiter;
use crate::services::arbiter_api::Arbiter;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use forecast_consensus::{
    config::Config,
    fetch::{BasicClient, HttpClient},
    forecast::{Location, NormalizedForecast, RawForecast},
    locations::{default_location, load_locations},
    normalize::normalize,
    output::{append_scores, print_json, print_pretty, write_json},
    pipeline::{LocationReport, aggregate_batch, aggregate_location, score_raw},
    providers::default_providers,
    visualize::{map_points, render_map, write_map},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "forecast_consensus")]
#[command(about = "Compare forecasts across providers and flag outliers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct LocationArgs {
    /// Prefecture name, e.g. 千葉県
    #[arg(long)]
    prefecture: Option<String>,

    /// City name, e.g. 千葉市
    #[arg(long)]
    city: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Tsukumijima city code, e.g. 120010
    #[arg(long)]
    code: Option<String>,
}

impl LocationArgs {
    /// Fills unset fields from the default location (Chiba).
    fn into_location(self) -> Location {
        let d = default_location();
        Location {
            prefecture: self.prefecture.unwrap_or(d.prefecture),
            city: self.city.unwrap_or(d.city),
            lat: self.lat.unwrap_or(d.lat),
            lon: self.lon.unwrap_or(d.lon),
            code: self.code.or(d.code),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, normalize and score every provider for one location
    Demo {
        #[command(flatten)]
        location: LocationArgs,

        /// Also ask the configured LLM for a consensus forecast
        #[arg(long, default_value_t = false)]
        llm: bool,
    },
    /// Score every location in a CSV list
    FetchAll {
        /// CSV with prefecture,city,latitude,longitude[,code]
        #[arg(short, long, default_value = "data/locations.csv")]
        locations: String,

        /// CSV file to append per-source scores to
        #[arg(short, long, default_value = "scores.csv")]
        output: String,

        /// Write the full batch report as JSON to this path
        #[arg(long)]
        report: Option<String>,

        /// Render a Leaflet map; without a path it goes to the temp directory
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        map: Option<Option<PathBuf>>,

        /// Maximum number of locations processed at once
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,

        /// Also ask the configured LLM for a consensus forecast per location
        #[arg(long, default_value_t = false)]
        llm: bool,

        /// Optional: S3 bucket to publish the report and map to
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Optional: Gzip compress files before uploading to S3
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Normalize and score a JSON array of raw forecasts without fetching
    Score {
        /// JSON file holding an array of raw forecast objects
        #[arg(value_name = "FILE")]
        file: String,

        #[command(flatten)]
        location: LocationArgs,
    },
}

/// Batch output written by `fetch-all --report` and published to S3.
#[derive(Serialize)]
struct BatchReport<'a> {
    generated_at: DateTime<Utc>,
    locations: &'a BTreeMap<String, LocationReport>,
    llm_decisions: BTreeMap<String, NormalizedForecast>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/forecast_consensus.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("forecast_consensus.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let http: Arc<dyn HttpClient> = Arc::new(BasicClient::with_timeout(config.http_timeout)?);
    let providers = default_providers(&config, http);

    match cli.command {
        Commands::Demo { location, llm } => {
            let arbiter = build_arbiter(&config, llm)?;
            let location = location.into_location();

            let report = aggregate_location(&providers, &location, config.http_timeout).await;
            show_report(&report, arbiter.as_ref()).await?;
        }
        Commands::FetchAll {
            locations,
            output,
            report,
            map,
            concurrency,
            llm,
            s3_bucket,
            gzip,
        } => {
            let arbiter = build_arbiter(&config, llm)?;
            let locations = load_locations(&locations)?;
            info!(count = locations.len(), "Locations loaded");

            let reports = aggregate_batch(
                Arc::new(providers),
                &locations,
                config.http_timeout,
                concurrency,
            )
            .await;

            let mut llm_decisions = BTreeMap::new();
            for (key, loc_report) in &reports {
                if !loc_report.has_valid_data() {
                    warn!(location = %key, "No valid forecast data, skipping scores");
                    continue;
                }
                append_scores(&output, key, &loc_report.deviation)?;

                if let Some(arbiter) = &arbiter {
                    let decided = normalize(&arbiter.arbitrate(&loc_report.normalized).await);
                    llm_decisions.insert(key.clone(), decided);
                }
            }

            let with_data = reports.values().filter(|r| r.has_valid_data()).count();
            let failed_calls: usize = reports.values().map(|r| r.failed_sources.len()).sum();
            info!(
                total = reports.len(),
                with_data,
                no_data = reports.len() - with_data,
                failed_calls,
                output = %output,
                "Batch summary"
            );

            let batch = BatchReport {
                generated_at: Utc::now(),
                locations: &reports,
                llm_decisions,
            };
            if let Some(path) = &report {
                write_json(path, &batch)?;
                info!(path = %path, "Report written");
            }

            let points = map_points(&reports);
            if let Some(path) = &map {
                write_map(&points, path.as_deref())?;
            }

            if let Some(bucket) = &s3_bucket {
                let html = render_map(&points)?;
                let json = serde_json::to_vec_pretty(&batch)?;
                publish(bucket, json, html, gzip).await;
            }
        }
        Commands::Score { file, location } => {
            let content =
                std::fs::read_to_string(&file).with_context(|| format!("reading {file}"))?;
            let raw: Vec<RawForecast> =
                serde_json::from_str(&content).with_context(|| format!("parsing {file}"))?;
            let location = location.into_location();

            let report = score_raw(&location.key(), location, raw);
            show_report(&report, None).await?;
        }
    }

    Ok(())
}

/// Builds the LLM arbiter when requested and configured.
fn build_arbiter(config: &Config, requested: bool) -> Result<Option<LlmArbiter>> {
    if !requested {
        return Ok(None);
    }
    match &config.llm {
        Some(llm) => Ok(Some(LlmArbiter::new(llm, config.http_timeout * 3)?)),
        None => {
            warn!("LLM_API_KEY is not set, skipping LLM arbitration");
            Ok(None)
        }
    }
}

/// Logs every stage of one location's report.
async fn show_report(report: &LocationReport, arbiter: Option<&LlmArbiter>) -> Result<()> {
    print_pretty(report);
    print_json("raw forecasts", &report.raw)?;
    print_json("normalized forecasts", &report.normalized)?;
    print_json("deviation scores", &report.deviation)?;

    match &report.decision {
        Ok(chosen) => print_json("decision", chosen)?,
        Err(e) => warn!(error = %e, "No decision"),
    }

    if let Some(arbiter) = arbiter {
        let decided = normalize(&arbiter.arbitrate(&report.normalized).await);
        print_json("LLM decision", &decided)?;
    }
    Ok(())
}

/// Uploads the batch report and map to S3. Failures are logged only.
#[tracing::instrument(skip(json, html))]
async fn publish(bucket: &str, json: Vec<u8>, html: String, gzip: bool) {
    let config = aws_config::load_from_env().await;
    let s3 = aws_sdk_s3::Client::new(&config);
    let date = Utc::now().format("%Y-%m-%d");

    let uploads = [
        (
            format!("reports/date={date}/report.json"),
            "application/json",
            json,
        ),
        (
            format!("maps/date={date}/map.html"),
            "text/html; charset=utf-8",
            html.into_bytes(),
        ),
    ];

    for (key, content_type, body) in uploads {
        if let Err(e) = infra::s3::upload(&s3, bucket, &key, content_type, body, gzip).await {
            error!(key = %key, error = %e, "Failed to upload to S3");
        }
    }
}
