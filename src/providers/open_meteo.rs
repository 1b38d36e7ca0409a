use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::ForecastProvider;
use crate::fetch::{HttpClient, fetch_json};
use crate::forecast::{Location, RawForecast};

const SOURCE: &str = "Open-Meteo";
const BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_probability_max";

pub struct OpenMeteo {
    client: Arc<dyn HttpClient>,
    base_url: String,
    timezone: String,
}

impl OpenMeteo {
    pub fn new(client: Arc<dyn HttpClient>, timezone: &str) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            timezone: timezone.to_string(),
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteo {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn request(&self, location: &Location) -> Result<RawForecast> {
        let query = [
            ("latitude", location.lat.to_string()),
            ("longitude", location.lon.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", self.timezone.clone()),
        ];
        let data = fetch_json(self.client.as_ref(), &self.base_url, &query).await?;
        parse_forecast(&data)
    }
}

/// Reads index 1 (tomorrow) of each daily series.
pub fn parse_forecast(data: &Value) -> Result<RawForecast> {
    let daily = &data["daily"];
    let tomorrow = |field: &str| -> Result<Value> {
        daily[field]
            .get(1)
            .cloned()
            .with_context(|| format!("daily.{field} has no value for tomorrow"))
    };

    let mut raw = RawForecast::new(SOURCE);
    raw.max_temp = Some(tomorrow("temperature_2m_max")?);
    raw.min_temp = Some(tomorrow("temperature_2m_min")?);
    raw.pop = Some(tomorrow("precipitation_probability_max")?);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn test_parse_forecast_reads_tomorrow() {
        let data = json!({
            "daily": {
                "time": ["2025-05-01", "2025-05-02"],
                "temperature_2m_max": [20.1, 22.4],
                "temperature_2m_min": [12.0, 13.6],
                "precipitation_probability_max": [5, 60]
            }
        });

        let raw = parse_forecast(&data).unwrap();
        assert_eq!(raw.source, Some(json!("Open-Meteo")));
        assert_eq!(raw.max_temp, Some(json!(22.4)));
        assert_eq!(raw.min_temp, Some(json!(13.6)));
        assert_eq!(raw.pop, Some(json!(60)));
    }

    #[test]
    fn test_parse_forecast_null_entry_normalizes_to_absent() {
        let data = json!({
            "daily": {
                "temperature_2m_max": [20.1, null],
                "temperature_2m_min": [12.0, 13.6],
                "precipitation_probability_max": [5, null]
            }
        });

        let n = normalize(&parse_forecast(&data).unwrap());
        assert_eq!(n.max_temp, None);
        assert_eq!(n.min_temp, Some(13.6));
        assert_eq!(n.pop, None);
    }

    #[test]
    fn test_parse_forecast_short_series_fails() {
        let data = json!({
            "daily": {
                "temperature_2m_max": [20.1],
                "temperature_2m_min": [12.0],
                "precipitation_probability_max": [5]
            }
        });
        assert!(parse_forecast(&data).is_err());
        assert!(parse_forecast(&json!({"error": true, "reason": "bad"})).is_err());
    }
}
