use thiserror::Error;

/// Conditions the pipeline reports to its caller instead of failing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("no valid forecast data for {location}")]
    NoValidForecast { location: String },
}
