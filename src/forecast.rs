//! Forecast records exchanged between providers, the normalizer and the scorer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A forecast exactly as a provider produced it.
///
/// Every field is an arbitrary JSON value because providers disagree on
/// types: temperatures arrive as numbers or numeric strings, `pop` as a
/// percentage or a 0–1 fraction. `None` (or JSON `null`) is the absent state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawForecast {
    pub source: Option<Value>,
    pub max_temp: Option<Value>,
    pub min_temp: Option<Value>,
    pub pop: Option<Value>,
    pub description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl RawForecast {
    pub fn new(source: &str) -> Self {
        Self {
            source: Some(Value::from(source)),
            ..Default::default()
        }
    }

    /// The record a provider hands back when it could not produce anything:
    /// only `source` is set.
    pub fn unavailable(source: &str) -> Self {
        Self::new(source)
    }

    pub fn with_max_temp(mut self, v: impl Into<Value>) -> Self {
        self.max_temp = Some(v.into());
        self
    }

    pub fn with_min_temp(mut self, v: impl Into<Value>) -> Self {
        self.min_temp = Some(v.into());
        self
    }

    pub fn with_pop(mut self, v: impl Into<Value>) -> Self {
        self.pop = Some(v.into());
        self
    }

    pub fn with_description(mut self, v: impl Into<Value>) -> Self {
        self.description = Some(v.into());
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lon);
        self
    }

    /// True when no forecast field carries a value.
    pub fn is_empty(&self) -> bool {
        [&self.max_temp, &self.min_temp, &self.pop, &self.description]
            .iter()
            .all(|v| matches!(v, None | Some(Value::Null)))
    }
}

/// A forecast in the canonical shape shared by every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    pub source: String,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    /// Precipitation probability in percent, 0..=100.
    pub pop: Option<u8>,
    pub description: Option<String>,
}

impl NormalizedForecast {
    pub fn has_numeric_data(&self) -> bool {
        self.max_temp.is_some() || self.min_temp.is_some() || self.pop.is_some()
    }
}

impl From<&NormalizedForecast> for RawForecast {
    fn from(n: &NormalizedForecast) -> Self {
        RawForecast {
            source: Some(Value::from(n.source.as_str())),
            max_temp: n.max_temp.map(Value::from),
            min_temp: n.min_temp.map(Value::from),
            pop: n.pop.map(Value::from),
            description: n.description.as_deref().map(Value::from),
            latitude: None,
            longitude: None,
        }
    }
}

/// A place to forecast for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub prefecture: String,
    pub city: String,
    #[serde(rename = "latitude", alias = "lat")]
    pub lat: f64,
    #[serde(rename = "longitude", alias = "lon")]
    pub lon: f64,
    /// Provider-specific city code (Tsukumijima city id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Location {
    /// Batch result key, `"{prefecture}_{city}"`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.prefecture, self.city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_forecast_deserializes_any_field_types() {
        let raw: RawForecast = serde_json::from_value(json!({
            "source": "WeatherAPI",
            "max_temp": "13.3",
            "min_temp": 7.7,
            "pop": null,
            "description": 9999,
            "unexpected": true
        }))
        .unwrap();

        assert_eq!(raw.source, Some(json!("WeatherAPI")));
        assert_eq!(raw.max_temp, Some(json!("13.3")));
        assert_eq!(raw.min_temp, Some(json!(7.7)));
        assert_eq!(raw.pop, None);
        assert_eq!(raw.description, Some(json!(9999)));
    }

    #[test]
    fn test_unavailable_is_empty() {
        let raw = RawForecast::unavailable("JMA");
        assert!(raw.is_empty());
        assert_eq!(raw.source, Some(json!("JMA")));
        assert!(!raw.with_pop(10).is_empty());
    }

    #[test]
    fn test_location_key() {
        let loc = Location {
            prefecture: "千葉県".to_string(),
            city: "千葉市".to_string(),
            lat: 35.6,
            lon: 140.1,
            code: None,
        };
        assert_eq!(loc.key(), "千葉県_千葉市");
    }
}
