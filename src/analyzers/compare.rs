use tracing::warn;

use crate::analyzers::types::{
    FieldDeviations, LocationDeviationReport, ReferenceValues, SourceDeviation,
};
use crate::analyzers::utility::{median, round_to};
use crate::forecast::NormalizedForecast;

/// Scores every forecast against the cross-source median of each field.
///
/// A field with no values anywhere gets no reference, and every source's
/// deviation for it is `None`; absent deviations add nothing to the score.
/// A source appearing more than once keeps its last record.
pub fn compare(forecasts: &[NormalizedForecast]) -> LocationDeviationReport {
    let max_temps: Vec<f64> = forecasts.iter().filter_map(|f| f.max_temp).collect();
    let min_temps: Vec<f64> = forecasts.iter().filter_map(|f| f.min_temp).collect();
    let pops: Vec<f64> = forecasts
        .iter()
        .filter_map(|f| f.pop.map(f64::from))
        .collect();

    let reference = ReferenceValues {
        max_temp: reference_for("max_temp", &max_temps),
        min_temp: reference_for("min_temp", &min_temps),
        pop: reference_for("pop", &pops),
    };

    let mut report = LocationDeviationReport {
        reference,
        ..Default::default()
    };

    for f in forecasts {
        let dev_max = deviation(f.max_temp, report.reference.max_temp);
        let dev_min = deviation(f.min_temp, report.reference.min_temp);
        let dev_pop = deviation(f.pop.map(f64::from), report.reference.pop);

        let total: f64 = [dev_max, dev_min, dev_pop].into_iter().flatten().sum();

        report.sources.insert(
            f.source.clone(),
            SourceDeviation {
                score: round_to(total, 2),
                details: FieldDeviations {
                    max_temp: dev_max.map(|d| round_to(d, 2)),
                    min_temp: dev_min.map(|d| round_to(d, 2)),
                    pop: dev_pop.map(|d| round_to(d, 2)),
                },
            },
        );
    }

    report
}

fn reference_for(field: &str, values: &[f64]) -> Option<f64> {
    let reference = median(values);
    if reference.is_none() {
        warn!(field, "No source supplied a value, reference unavailable");
    }
    reference
}

fn deviation(value: Option<f64>, reference: Option<f64>) -> Option<f64> {
    Some((value? - reference?).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(
        source: &str,
        max: Option<f64>,
        min: Option<f64>,
        pop: Option<u8>,
    ) -> NormalizedForecast {
        NormalizedForecast {
            source: source.to_string(),
            max_temp: max,
            min_temp: min,
            pop,
            description: None,
        }
    }

    #[test]
    fn test_median_reference_and_deviations() {
        let report = compare(&[
            forecast("A", Some(10.0), None, None),
            forecast("B", Some(12.0), None, None),
            forecast("C", Some(14.0), None, None),
        ]);

        assert_eq!(report.reference.max_temp, Some(12.0));
        assert_eq!(report.get("A").unwrap().details.max_temp, Some(2.0));
        assert_eq!(report.get("B").unwrap().details.max_temp, Some(0.0));
        assert_eq!(report.get("C").unwrap().details.max_temp, Some(2.0));
        assert_eq!(report.get("A").unwrap().score, 2.0);
    }

    #[test]
    fn test_all_absent_field_contributes_nothing() {
        let report = compare(&[
            forecast("A", Some(10.0), None, Some(20)),
            forecast("B", Some(11.0), None, Some(40)),
        ]);

        assert_eq!(report.reference.min_temp, None);
        for dev in report.sources.values() {
            assert_eq!(dev.details.min_temp, None);
        }
        let a = report.get("A").unwrap();
        // max ref 10.5, pop ref 30
        assert_eq!(a.details.max_temp, Some(0.5));
        assert_eq!(a.details.pop, Some(10.0));
        assert_eq!(a.score, 10.5);
    }

    #[test]
    fn test_duplicate_source_last_write_wins() {
        let report = compare(&[
            forecast("A", Some(10.0), None, None),
            forecast("B", Some(20.0), None, None),
            forecast("A", Some(30.0), None, None),
        ]);

        assert_eq!(report.sources.len(), 2);
        // reference uses all three records: median of 10, 20, 30
        assert_eq!(report.reference.max_temp, Some(20.0));
        assert_eq!(report.get("A").unwrap().details.max_temp, Some(10.0));
    }

    #[test]
    fn test_gross_outlier_is_most_deviant() {
        let report = compare(&[
            forecast("A", Some(10.0), None, None),
            forecast("B", Some(10.0), None, None),
            forecast("C", Some(100.0), None, None),
        ]);

        assert_eq!(report.reference.max_temp, Some(10.0));
        assert_eq!(report.get("C").unwrap().details.max_temp, Some(90.0));
        let (source, dev) = report.most_deviant().unwrap();
        assert_eq!(source, "C");
        assert_eq!(dev.score, 90.0);
    }

    #[test]
    fn test_source_without_data_scores_zero() {
        let report = compare(&[
            forecast("A", Some(10.0), Some(5.0), Some(30)),
            forecast("JMA", None, None, None),
        ]);

        let jma = report.get("JMA").unwrap();
        assert_eq!(jma.score, 0.0);
        assert_eq!(jma.details, FieldDeviations::default());
    }

    #[test]
    fn test_empty_input() {
        let report = compare(&[]);
        assert!(report.sources.is_empty());
        assert_eq!(report.reference, ReferenceValues::default());
        assert_eq!(report.average_score(), None);
    }

    #[test]
    fn test_deviations_rounded_to_two_decimals() {
        let report = compare(&[
            forecast("A", Some(13.3), Some(7.7), Some(88)),
            forecast("B", Some(14.6), Some(5.2), Some(90)),
            forecast("C", Some(12.0), Some(8.0), Some(10)),
        ]);

        let a = report.get("A").unwrap();
        assert_eq!(a.details.max_temp, Some(0.0));
        assert_eq!(a.details.min_temp, Some(0.0));
        assert_eq!(a.details.pop, Some(0.0));
        let b = report.get("B").unwrap();
        assert_eq!(b.details.max_temp, Some(1.3));
        assert_eq!(b.details.min_temp, Some(2.5));
        assert_eq!(b.details.pop, Some(2.0));
        assert_eq!(b.score, 5.8);
    }
}
