//! Runtime configuration, built once at startup and passed to collaborators.

use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Settings for the optional LLM arbiter.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub openweather_api_key: Option<String>,
    pub weatherapi_api_key: Option<String>,
    /// Upper bound on a single provider call.
    pub http_timeout: Duration,
    /// Timezone Open-Meteo uses to cut daily series.
    pub timezone: String,
    /// `None` disables LLM arbitration.
    pub llm: Option<LlmConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            weatherapi_api_key: None,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            timezone: DEFAULT_TIMEZONE.to_string(),
            llm: None,
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .with_context(|| {
                        format!("HTTP_TIMEOUT_SECS must be whole seconds, got '{v}'")
                    })?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let llm = get("LLM_API_KEY").map(|api_key| LlmConfig {
            api_key,
            base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        });

        Ok(Self {
            openweather_api_key: get("OPENWEATHER_API_KEY"),
            weatherapi_api_key: get("WEATHERAPI_API_KEY"),
            http_timeout,
            timezone: get("OPEN_METEO_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            llm,
        })
    }
}
