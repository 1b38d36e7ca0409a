//! Aggregation driver: fetch → normalize → compare → decide, per location.
//!
//! Locations never share state; a batch is the same single-location pass
//! run for each entry of the location list.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{Instrument, error, info, warn};

use crate::analyzers::compare::compare;
use crate::analyzers::decide::decide_by_median;
use crate::analyzers::types::LocationDeviationReport;
use crate::error::PipelineError;
use crate::forecast::{Location, NormalizedForecast, RawForecast};
use crate::normalize::normalize_all;
use crate::providers::{FetchOutcome, ForecastProvider, fetch};

/// Everything the driver learned about one location.
#[derive(Debug, Clone, Serialize)]
pub struct LocationReport {
    pub key: String,
    pub location: Location,
    pub raw: Vec<RawForecast>,
    pub normalized: Vec<NormalizedForecast>,
    pub deviation: LocationDeviationReport,
    pub failed_sources: Vec<String>,
    #[serde(serialize_with = "serialize_decision")]
    pub decision: Result<NormalizedForecast, PipelineError>,
}

impl LocationReport {
    /// True when at least one source supplied a numeric field.
    pub fn has_valid_data(&self) -> bool {
        self.normalized.iter().any(NormalizedForecast::has_numeric_data)
    }
}

/// Written form of a decision: the chosen record, or `{"error": "..."}`.
#[derive(Serialize)]
#[serde(untagged)]
enum DecisionOut<'a> {
    Chosen(&'a NormalizedForecast),
    Failed { error: String },
}

fn serialize_decision<S: serde::Serializer>(
    decision: &Result<NormalizedForecast, PipelineError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let out = match decision {
        Ok(chosen) => DecisionOut::Chosen(chosen),
        Err(e) => DecisionOut::Failed {
            error: e.to_string(),
        },
    };
    out.serialize(serializer)
}

/// Normalizes and scores an already-collected list of raw forecasts.
pub fn score_raw(key: &str, location: Location, raw: Vec<RawForecast>) -> LocationReport {
    let normalized = normalize_all(&raw);
    let deviation = compare(&normalized);
    let decision = decide_by_median(key, &normalized);

    LocationReport {
        key: key.to_string(),
        location,
        raw,
        normalized,
        deviation,
        failed_sources: Vec::new(),
        decision,
    }
}

/// Runs every provider for one location, concurrently, each under `timeout`.
///
/// Results keep provider order. Failed calls contribute an all-absent record
/// and are listed in `failed_sources`.
pub async fn aggregate_location(
    providers: &[Arc<dyn ForecastProvider>],
    location: &Location,
    timeout: Duration,
) -> LocationReport {
    let key = location.key();

    let mut tasks = Vec::with_capacity(providers.len());
    for provider in providers {
        let provider = provider.clone();
        let location = location.clone();
        tasks.push(tokio::spawn(async move {
            fetch(provider.as_ref(), &location, timeout).await
        }));
    }

    let mut raw = Vec::with_capacity(tasks.len());
    let mut failed_sources = Vec::new();
    for (task, provider) in tasks.into_iter().zip(providers) {
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(source = provider.name(), error = %e, "Provider task aborted");
                FetchOutcome::Failed {
                    source: provider.name().to_string(),
                    reason: e.to_string(),
                }
            }
        };
        if let FetchOutcome::Failed { source, .. } = &outcome {
            failed_sources.push(source.clone());
        }
        raw.push(
            outcome
                .into_raw()
                .with_coordinates(location.lat, location.lon),
        );
    }

    let mut report = score_raw(&key, location.clone(), raw);
    report.failed_sources = failed_sources;

    if report.has_valid_data() {
        info!(
            location = %key,
            sources = report.normalized.len(),
            failed = report.failed_sources.len(),
            "Location scored"
        );
    } else {
        warn!(location = %key, "No provider returned usable data");
    }
    report
}

/// Runs [`aggregate_location`] for every location, at most `concurrency`
/// locations at a time. Results are keyed by `"{prefecture}_{city}"`.
#[tracing::instrument(skip(providers, locations), fields(locations = locations.len()))]
pub async fn aggregate_batch(
    providers: Arc<Vec<Arc<dyn ForecastProvider>>>,
    locations: &[Location],
    timeout: Duration,
    concurrency: usize,
) -> BTreeMap<String, LocationReport> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut tasks = Vec::with_capacity(locations.len());
    for location in locations {
        let sem = semaphore.clone();
        let providers = providers.clone();
        let location = location.clone();
        let span = tracing::info_span!("location", key = %location.key());

        tasks.push(tokio::spawn(
            async move {
                // The semaphore is never closed.
                let _permit = sem.acquire_owned().await.ok();
                aggregate_location(&providers, &location, timeout).await
            }
            .instrument(span),
        ));
    }

    let mut results = BTreeMap::new();
    for (task, location) in tasks.into_iter().zip(locations) {
        match task.await {
            Ok(report) => {
                results.insert(report.key.clone(), report);
            }
            Err(e) => error!(location = %location.key(), error = %e, "Location task aborted"),
        }
    }

    info!(scored = results.len(), "Batch complete");
    results
}
