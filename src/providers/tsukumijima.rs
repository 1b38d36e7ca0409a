use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::ForecastProvider;
use crate::fetch::{HttpClient, fetch_json};
use crate::forecast::{Location, RawForecast};

const SOURCE: &str = "Tsukumijima";
const BASE_URL: &str = "https://weather.tsukumijima.net/api/forecast/city";

/// weather.tsukumijima.net, a JSON mirror of the JMA city forecasts.
///
/// Needs the location's city `code` (e.g. `120010` for Chiba).
pub struct Tsukumijima {
    client: Arc<dyn HttpClient>,
    base_url: String,
}

impl Tsukumijima {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl ForecastProvider for Tsukumijima {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn request(&self, location: &Location) -> Result<RawForecast> {
        let code = location
            .code
            .as_deref()
            .with_context(|| format!("no city code for {}", location.key()))?;
        let url = format!("{}/{}", self.base_url, code);
        let data = fetch_json(self.client.as_ref(), &url, &[]).await?;
        parse_forecast(&data)
    }
}

/// Reads tomorrow (`forecasts[1]`) from a city forecast response.
///
/// Temperatures are strings like `"21"` or null and are passed on as-is.
/// `pop` is the truncated mean of the per-period `chanceOfRain` percentages,
/// skipping `"--"` periods, or 0 when no period has a value.
pub fn parse_forecast(data: &Value) -> Result<RawForecast> {
    let forecast = data["forecasts"]
        .get(1)
        .context("response has no forecast for tomorrow")?;

    let chances = forecast["chanceOfRain"]
        .as_object()
        .context("chanceOfRain missing")?;

    let mut pops = Vec::new();
    for value in chances.values() {
        let Some(s) = value.as_str() else { continue };
        if s == "--" {
            continue;
        }
        let pct: i64 = s
            .trim()
            .trim_end_matches('%')
            .parse()
            .with_context(|| format!("unreadable chanceOfRain value '{s}'"))?;
        pops.push(pct);
    }
    let pop = if pops.is_empty() {
        0
    } else {
        pops.iter().sum::<i64>() / pops.len() as i64
    };

    let mut raw = RawForecast::new(SOURCE).with_pop(pop);
    raw.max_temp = present(&forecast["temperature"]["max"]["celsius"]);
    raw.min_temp = present(&forecast["temperature"]["min"]["celsius"]);
    Ok(raw)
}

fn present(v: &Value) -> Option<Value> {
    match v {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(other.clone()),
    }
}
