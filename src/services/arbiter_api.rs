//! Trait for an external judge that proposes one forecast from many.

use forecast_consensus::forecast::{NormalizedForecast, RawForecast};

/// Source name on every arbitrated record.
pub const ARBITER_SOURCE: &str = "LLM-Decider";

/// Proposes the most plausible forecast given every source's record.
///
/// Implementations never fail: on any error they return
/// `RawForecast::unavailable(ARBITER_SOURCE)`, which normalizes to an
/// all-absent record.
#[async_trait::async_trait]
pub trait Arbiter: Send + Sync {
    async fn arbitrate(&self, forecasts: &[NormalizedForecast]) -> RawForecast;
}
