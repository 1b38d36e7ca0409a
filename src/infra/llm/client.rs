use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::services::arbiter_api::{ARBITER_SOURCE, Arbiter};
use forecast_consensus::config::LlmConfig;
use forecast_consensus::fetch::auth::ApiKey;
use forecast_consensus::fetch::{BasicClient, post_json};
use forecast_consensus::forecast::{NormalizedForecast, RawForecast};

const PROMPT: &str = r#"Below are tomorrow's forecasts for one location from several
weather sources. Give the single most plausible maximum temperature (max_temp, °C),
minimum temperature (min_temp, °C) and precipitation probability (pop, percent).

- Stay close to the median of the values.
- You may ignore values that are far off.
- Weigh which sources look trustworthy overall.

Answer with JSON only, in this shape:
{"max_temp": float or null, "min_temp": float or null, "pop": int or null}

Data:
"#;

/// [`Arbiter`] backed by an OpenAI-compatible chat completions endpoint.
pub struct LlmArbiter {
    client: ApiKey<BasicClient>,
    endpoint: String,
    model: String,
}

impl LlmArbiter {
    pub fn new(config: &LlmConfig, timeout: Duration) -> Result<Self> {
        let client = ApiKey::bearer(BasicClient::with_timeout(timeout)?, &config.api_key)?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    async fn ask(&self, forecasts: &[NormalizedForecast]) -> Result<RawForecast> {
        let prompt = format!("{PROMPT}{}", serde_json::to_string_pretty(forecasts)?);
        let body = json!({
            "model": self.model,
            "temperature": 0.3,
            "messages": [{ "role": "user", "content": prompt }]
        });

        let resp = post_json(&self.client, &self.endpoint, &body).await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .context("no content in chat completion response")?;

        parse_decision(content)
    }
}

#[async_trait]
impl Arbiter for LlmArbiter {
    #[tracing::instrument(skip_all, fields(model = %self.model, sources = forecasts.len()))]
    async fn arbitrate(&self, forecasts: &[NormalizedForecast]) -> RawForecast {
        if forecasts.is_empty() {
            warn!("Nothing to arbitrate");
            return RawForecast::unavailable(ARBITER_SOURCE);
        }

        match self.ask(forecasts).await {
            Ok(raw) => {
                info!("LLM decision received");
                raw
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "LLM arbitration failed");
                RawForecast::unavailable(ARBITER_SOURCE)
            }
        }
    }
}

/// Extracts the first `{...}` object from a model reply, tolerating code
/// fences and surrounding prose.
fn parse_decision(content: &str) -> Result<RawForecast> {
    let start = content.find('{').context("no JSON object in reply")?;
    let value: Value = serde_json::Deserializer::from_str(&content[start..])
        .into_iter::<Value>()
        .next()
        .context("no JSON object in reply")?
        .context("reply is not valid JSON")?;
    let field = |name: &str| match &value[name] {
        Value::Null => None,
        v => Some(v.clone()),
    };

    let mut raw = RawForecast::new(ARBITER_SOURCE);
    raw.max_temp = field("max_temp");
    raw.min_temp = field("min_temp");
    raw.pop = field("pop");
    Ok(raw)
}
