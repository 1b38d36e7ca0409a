use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use serde_json::Value;
use std::sync::Arc;

use super::ForecastProvider;
use crate::fetch::auth::UrlParam;
use crate::fetch::{HttpClient, fetch_json};
use crate::forecast::{Location, RawForecast};

const SOURCE: &str = "OpenWeatherMap";
const BASE_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// OpenWeatherMap 5 day / 3 hour forecast, reduced to tomorrow's extremes.
pub struct OpenWeather {
    client: Option<UrlParam<Arc<dyn HttpClient>>>,
    base_url: String,
}

impl OpenWeather {
    /// Without an API key every request fails.
    pub fn new(client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            client: api_key.map(|key| UrlParam::new(client, "appid", key)),
            base_url: BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenWeather {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn request(&self, location: &Location) -> Result<RawForecast> {
        let client = self
            .client
            .as_ref()
            .context("OPENWEATHER_API_KEY is not set")?;
        let query = [
            ("lat", location.lat.to_string()),
            ("lon", location.lon.to_string()),
            ("units", "metric".to_string()),
            ("lang", "ja".to_string()),
        ];
        let data = fetch_json(client, &self.base_url, &query).await?;

        let tomorrow = Local::now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .context("date out of range")?;
        parse_forecast(&data, tomorrow)
    }
}

/// Reduces the 3-hourly entries dated `tomorrow` to one record.
///
/// `max_temp` is the highest `main.temp_max`, `min_temp` the lowest
/// `main.temp_min`, and `pop` the highest `pop`, left as a 0–1 fraction for
/// the normalizer to scale.
pub fn parse_forecast(data: &Value, tomorrow: NaiveDate) -> Result<RawForecast> {
    let prefix = tomorrow.format("%Y-%m-%d").to_string();
    let entries: Vec<&Value> = data["list"]
        .as_array()
        .context("response has no list")?
        .iter()
        .filter(|e| e["dt_txt"].as_str().is_some_and(|t| t.starts_with(&prefix)))
        .collect();

    if entries.is_empty() {
        bail!("no forecast entries for {prefix}");
    }

    let max_temp = entries
        .iter()
        .filter_map(|e| e["main"]["temp_max"].as_f64())
        .max_by(f64::total_cmp)
        .context("no temp_max for tomorrow")?;
    let min_temp = entries
        .iter()
        .filter_map(|e| e["main"]["temp_min"].as_f64())
        .min_by(f64::total_cmp)
        .context("no temp_min for tomorrow")?;
    let pop = entries
        .iter()
        .map(|e| e["pop"].as_f64().unwrap_or(0.0))
        .max_by(f64::total_cmp)
        .unwrap_or(0.0);

    Ok(RawForecast::new(SOURCE)
        .with_max_temp(max_temp)
        .with_min_temp(min_temp)
        .with_pop(pop))
}
