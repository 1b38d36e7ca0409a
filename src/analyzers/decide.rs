use tracing::{info, warn};

use crate::error::PipelineError;
use crate::forecast::NormalizedForecast;

/// Picks the forecast whose `max_temp` is closest to the median `max_temp`.
///
/// The median here is the upper middle element of the sorted values, and the
/// first record wins a tie on distance. Records without `max_temp` are not
/// candidates.
pub fn decide_by_median(
    location: &str,
    forecasts: &[NormalizedForecast],
) -> Result<NormalizedForecast, PipelineError> {
    let valid: Vec<(&NormalizedForecast, f64)> = forecasts
        .iter()
        .filter_map(|f| f.max_temp.map(|t| (f, t)))
        .collect();

    if valid.is_empty() {
        warn!(location, "No valid forecast data");
        return Err(PipelineError::NoValidForecast {
            location: location.to_string(),
        });
    }

    let mut temps: Vec<f64> = valid.iter().map(|(_, t)| *t).collect();
    temps.sort_by(f64::total_cmp);
    let median = temps[temps.len() / 2];

    let mut chosen = valid[0];
    for candidate in &valid[1..] {
        if (candidate.1 - median).abs() < (chosen.1 - median).abs() {
            chosen = *candidate;
        }
    }

    info!(location, source = %chosen.0.source, median, "Final decision");
    Ok(chosen.0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(source: &str, max: Option<f64>) -> NormalizedForecast {
        NormalizedForecast {
            source: source.to_string(),
            max_temp: max,
            min_temp: None,
            pop: None,
            description: None,
        }
    }

    #[test]
    fn test_picks_closest_to_median() {
        let chosen = decide_by_median(
            "here",
            &[
                forecast("A", Some(13.3)),
                forecast("B", Some(13.5)),
                forecast("C", Some(14.6)),
                forecast("D", Some(100.0)),
            ],
        )
        .unwrap();
        // upper median of four values is 14.6
        assert_eq!(chosen.source, "C");
    }

    #[test]
    fn test_skips_records_without_max_temp() {
        let chosen = decide_by_median(
            "here",
            &[forecast("JMA", None), forecast("A", Some(10.0))],
        )
        .unwrap();
        assert_eq!(chosen.source, "A");
    }

    #[test]
    fn test_first_wins_tie() {
        let chosen = decide_by_median(
            "here",
            &[forecast("A", Some(9.0)), forecast("B", Some(10.0)), forecast("C", Some(11.0))],
        )
        .unwrap();
        assert_eq!(chosen.source, "B");

        let forecasts = [forecast("A", Some(9.0)), forecast("B", Some(11.0))];
        let chosen = decide_by_median("here", &forecasts).unwrap();
        // median is 11.0, B is exact
        assert_eq!(chosen.source, "B");
    }

    #[test]
    fn test_no_valid_data() {
        let err = decide_by_median("千葉県_千葉市", &[forecast("JMA", None)]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::NoValidForecast {
                location: "千葉県_千葉市".to_string()
            }
        );
        assert!(decide_by_median("x", &[]).is_err());
    }
}
