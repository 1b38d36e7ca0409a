use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::ForecastProvider;
use crate::fetch::auth::UrlParam;
use crate::fetch::{HttpClient, fetch_json};
use crate::forecast::{Location, RawForecast};

const SOURCE: &str = "WeatherAPI";
const BASE_URL: &str = "https://api.weatherapi.com/v1/forecast.json";

/// WeatherAPI.com daily forecast, queried by coordinates.
pub struct WeatherApi {
    client: Option<UrlParam<Arc<dyn HttpClient>>>,
    base_url: String,
}

impl WeatherApi {
    /// Without an API key every request fails.
    pub fn new(client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            client: api_key.map(|key| UrlParam::new(client, "key", key)),
            base_url: BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl ForecastProvider for WeatherApi {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn request(&self, location: &Location) -> Result<RawForecast> {
        let client = self
            .client
            .as_ref()
            .context("WEATHERAPI_API_KEY is not set")?;
        let query = [
            ("q", format!("{},{}", location.lat, location.lon)),
            ("days", "3".to_string()),
            ("lang", "ja".to_string()),
        ];
        let data = fetch_json(client, &self.base_url, &query).await?;
        parse_forecast(&data)
    }
}

/// Reads `forecast.forecastday[1].day`; a missing `daily_chance_of_rain`
/// counts as 0.
pub fn parse_forecast(data: &Value) -> Result<RawForecast> {
    let day = &data["forecast"]["forecastday"]
        .get(1)
        .context("response has no forecast for tomorrow")?["day"];

    let max_temp = day["maxtemp_c"].as_f64().context("maxtemp_c missing")?;
    let min_temp = day["mintemp_c"].as_f64().context("mintemp_c missing")?;
    let pop = match &day["daily_chance_of_rain"] {
        Value::Null => Value::from(0),
        v => v.clone(),
    };

    Ok(RawForecast::new(SOURCE)
        .with_max_temp(max_temp)
        .with_min_temp(min_temp)
        .with_pop(pop))
}
