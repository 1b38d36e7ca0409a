//! Weather forecast providers.
//!
//! Each provider implements [`ForecastProvider::request`], which may fail.
//! Callers go through [`fetch`], which bounds the call with a timeout and
//! turns any failure into [`FetchOutcome::Failed`], so one broken provider
//! never stops a batch.

mod jma;
mod open_meteo;
mod openweather;
mod tsukumijima;
mod weatherapi;

pub use jma::{Jma, area_code};
pub use open_meteo::OpenMeteo;
pub use openweather::OpenWeather;
pub use tsukumijima::Tsukumijima;
pub use weatherapi::WeatherApi;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::fetch::HttpClient;
use crate::forecast::{Location, RawForecast};

/// A source of one-day-ahead forecasts.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Name written into the `source` field of every record.
    fn name(&self) -> &'static str;

    /// Fetches tomorrow's forecast for `location`.
    async fn request(&self, location: &Location) -> Result<RawForecast>;
}

/// What came back from one provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(RawForecast),
    Failed { source: String, reason: String },
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }

    /// The raw record; a failure becomes a record with only `source` set.
    pub fn into_raw(self) -> RawForecast {
        match self {
            FetchOutcome::Fetched(raw) => raw,
            FetchOutcome::Failed { source, .. } => RawForecast::unavailable(&source),
        }
    }
}

/// Calls `provider` once, giving up after `timeout`. Never fails.
pub async fn fetch(
    provider: &dyn ForecastProvider,
    location: &Location,
    timeout: Duration,
) -> FetchOutcome {
    let source = provider.name();
    let start = Instant::now();

    let reason = match tokio::time::timeout(timeout, provider.request(location)).await {
        Ok(Ok(raw)) => {
            debug!(source, elapsed_ms = start.elapsed().as_millis() as u64, "Forecast fetched");
            return FetchOutcome::Fetched(raw);
        }
        Ok(Err(e)) => {
            let reason = format!("{e:#}");
            error!(source, location = %location.key(), error = %reason, "Provider call failed");
            reason
        }
        Err(_) => {
            warn!(
                source,
                location = %location.key(),
                timeout_secs = timeout.as_secs_f64(),
                "Provider call timed out"
            );
            format!("timed out after {:?}", timeout)
        }
    };

    FetchOutcome::Failed {
        source: source.to_string(),
        reason,
    }
}

/// The five stock providers, sharing one HTTP client.
pub fn default_providers(
    config: &Config,
    client: Arc<dyn HttpClient>,
) -> Vec<Arc<dyn ForecastProvider>> {
    vec![
        Arc::new(Tsukumijima::new(client.clone())),
        Arc::new(OpenWeather::new(client.clone(), config.openweather_api_key.clone())),
        Arc::new(WeatherApi::new(client.clone(), config.weatherapi_api_key.clone())),
        Arc::new(OpenMeteo::new(client.clone(), &config.timezone)),
        Arc::new(Jma::new(client)),
    ]
}
