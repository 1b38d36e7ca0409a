//! Cross-source comparison of normalized forecasts.
//!
//! This module computes per-field reference medians, scores each source by
//! its distance from them, picks a single representative forecast, and maps
//! scores onto agreement bands for display.

pub mod band;
pub mod compare;
pub mod decide;
pub mod types;
pub mod utility;
