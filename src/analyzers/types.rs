//! Data types produced by the scoring pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-field absolute deviation from the reference median.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDeviations {
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub pop: Option<f64>,
}

/// Deviation score of one source for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDeviation {
    pub score: f64,
    pub details: FieldDeviations,
}

/// Cross-source medians used as the deviation baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceValues {
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub pop: Option<f64>,
}

/// Scores for every source of one location, keyed by source name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationDeviationReport {
    pub reference: ReferenceValues,
    pub sources: BTreeMap<String, SourceDeviation>,
}

impl LocationDeviationReport {
    pub fn get(&self, source: &str) -> Option<&SourceDeviation> {
        self.sources.get(source)
    }

    /// The source with the highest score, if any source was scored.
    pub fn most_deviant(&self) -> Option<(&str, &SourceDeviation)> {
        self.sources
            .iter()
            .max_by(|a, b| a.1.score.total_cmp(&b.1.score))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Mean of the source scores; `None` when no source was scored.
    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self.sources.values().map(|s| s.score).collect();
        super::utility::mean(&scores)
    }
}
