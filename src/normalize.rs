//! Coercion of raw provider output into [`NormalizedForecast`].
//!
//! Normalization is total: a field that cannot be converted becomes `None`
//! and never fails the record or the batch.
//!
//! Rounding is half away from zero (`f64::round`) for both the one-decimal
//! temperatures and the integer precipitation probability.

use serde_json::Value;

use crate::forecast::{NormalizedForecast, RawForecast};

const UNKNOWN_SOURCE: &str = "Unknown";

/// Normalizes one raw forecast.
pub fn normalize(raw: &RawForecast) -> NormalizedForecast {
    NormalizedForecast {
        source: normalize_source(raw.source.as_ref()),
        max_temp: raw.max_temp.as_ref().and_then(normalize_temp),
        min_temp: raw.min_temp.as_ref().and_then(normalize_temp),
        pop: raw.pop.as_ref().and_then(normalize_pop),
        description: match &raw.description {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        },
    }
}

/// Normalizes a list of raw forecasts, preserving order.
pub fn normalize_all(raws: &[RawForecast]) -> Vec<NormalizedForecast> {
    raws.iter().map(normalize).collect()
}

fn normalize_source(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => UNKNOWN_SOURCE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Converts a JSON number or numeric-looking string to a finite `f64`.
///
/// Booleans, arrays and objects are not numeric.
fn to_finite(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn normalize_temp(v: &Value) -> Option<f64> {
    to_finite(v).map(round_one_decimal)
}

fn round_one_decimal(v: f64) -> f64 {
    let r = (v * 10.0).round() / 10.0;
    // Magnitudes this large have no fractional digit left to round.
    if r.is_finite() { r } else { v }
}

/// Values in `[0, 1]` are read as a fraction and scaled to percent, so an
/// integer `1` becomes 100%.
fn normalize_pop(v: &Value) -> Option<u8> {
    let mut pop = to_finite(v)?;
    if (0.0..=1.0).contains(&pop) {
        pop *= 100.0;
    }
    let pop = pop.round();
    (0.0..=100.0).contains(&pop).then_some(pop as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawForecast {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let n = normalize(&raw(json!({
            "source": "WeatherAPI",
            "max_temp": "13.3",
            "min_temp": "7.7",
            "pop": "88",
            "description": "雨が降るでしょう"
        })));

        assert_eq!(n.source, "WeatherAPI");
        assert_eq!(n.max_temp, Some(13.3));
        assert_eq!(n.min_temp, Some(7.7));
        assert_eq!(n.pop, Some(88));
        assert_eq!(n.description.as_deref(), Some("雨が降るでしょう"));
    }

    #[test]
    fn test_broken_values_become_absent() {
        let n = normalize(&raw(json!({
            "source": "BrokenAPI",
            "max_temp": "NaN",
            "min_temp": "oops",
            "pop": "xx",
            "description": 9999
        })));

        assert_eq!(n.source, "BrokenAPI");
        assert_eq!(n.max_temp, None);
        assert_eq!(n.min_temp, None);
        assert_eq!(n.pop, None);
        assert_eq!(n.description, None);
    }

    #[test]
    fn test_non_finite_strings_rejected() {
        for s in ["NaN", "nan", "inf", "-inf", "Infinity"] {
            let n = normalize(&RawForecast::new("X").with_max_temp(s).with_pop(s));
            assert_eq!(n.max_temp, None, "{s}");
            assert_eq!(n.pop, None, "{s}");
        }
    }

    #[test]
    fn test_missing_source_defaults_to_unknown() {
        let n = normalize(&RawForecast::default());
        assert_eq!(n.source, "Unknown");
        assert!(!n.has_numeric_data());
    }

    #[test]
    fn test_non_string_source_is_stringified() {
        let n = normalize(&raw(json!({ "source": 42 })));
        assert_eq!(n.source, "42");
    }

    #[test]
    fn test_temperatures_round_to_one_decimal() {
        let n = normalize(&RawForecast::new("X").with_max_temp(26.44).with_min_temp(-3.25));
        assert_eq!(n.max_temp, Some(26.4));
        // half away from zero
        assert_eq!(n.min_temp, Some(-3.3));
    }

    #[test]
    fn test_pop_fraction_is_scaled() {
        let n = normalize(&RawForecast::new("X").with_pop(0.5));
        assert_eq!(n.pop, Some(50));
    }

    #[test]
    fn test_pop_of_one_reads_as_full_fraction() {
        let n = normalize(&RawForecast::new("X").with_pop(1));
        assert_eq!(n.pop, Some(100));
        let n = normalize(&RawForecast::new("X").with_pop(0));
        assert_eq!(n.pop, Some(0));
    }

    #[test]
    fn test_pop_percent_is_rounded() {
        let n = normalize(&RawForecast::new("X").with_pop(42.5));
        assert_eq!(n.pop, Some(43));
        let n = normalize(&RawForecast::new("X").with_pop(" 30 "));
        assert_eq!(n.pop, Some(30));
    }

    #[test]
    fn test_pop_out_of_range_is_absent() {
        assert_eq!(normalize(&RawForecast::new("X").with_pop(150)).pop, None);
        assert_eq!(normalize(&RawForecast::new("X").with_pop(-5)).pop, None);
    }

    #[test]
    fn test_wrong_types_become_absent() {
        let n = normalize(&raw(json!({
            "source": "X",
            "max_temp": true,
            "min_temp": [1, 2],
            "pop": { "value": 10 },
            "description": ["a"]
        })));
        assert_eq!(n.max_temp, None);
        assert_eq!(n.min_temp, None);
        assert_eq!(n.pop, None);
        assert_eq!(n.description, None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            raw(json!({
                "source": "A",
                "max_temp": "13.34",
                "min_temp": 7.75,
                "pop": 0.35,
                "description": "晴れ"
            })),
            raw(json!({"source": "B", "max_temp": 14.6, "min_temp": null, "pop": "88"})),
            raw(json!({"max_temp": "NaN", "pop": 100})),
            RawForecast::default(),
        ];

        for input in &inputs {
            let once = normalize(input);
            let twice = normalize(&RawForecast::from(&once));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_outputs_stay_in_range_for_assorted_inputs() {
        let values = [
            json!(null),
            json!(""),
            json!("1e400"),
            json!(-0.0),
            json!(0.004),
            json!(0.999),
            json!(1.0000001),
            json!(99.5),
            json!(100.49),
            json!(f64::MAX),
            json!(i64::MIN),
            json!("  12  "),
        ];

        for v in &values {
            let mut r = RawForecast::new("X");
            r.max_temp = Some(v.clone());
            r.pop = Some(v.clone());
            let n = normalize(&r);
            if let Some(t) = n.max_temp {
                assert!(t.is_finite());
            }
            if let Some(p) = n.pop {
                assert!(p <= 100);
            }
        }
    }
}
