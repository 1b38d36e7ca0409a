//! CSV loader for the batch location list.
//!
//! Expected header: `prefecture,city,latitude,longitude` with an optional
//! `code` column carrying the Tsukumijima city id.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use tracing::debug;

use crate::forecast::Location;

/// Reads every location from the CSV file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row is malformed.
pub fn load_locations(path: &str) -> Result<Vec<Location>> {
    let file = File::open(path).with_context(|| format!("opening location list {path}"))?;
    let locations = read_locations(file).with_context(|| format!("parsing location list {path}"))?;
    debug!(path, count = locations.len(), "Locations loaded");
    Ok(locations)
}

/// Reads locations from any CSV source.
pub fn read_locations<R: Read>(reader: R) -> Result<Vec<Location>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut locations = Vec::new();
    for result in rdr.deserialize() {
        let mut location: Location = result?;
        if location.code.as_deref().is_some_and(str::is_empty) {
            location.code = None;
        }
        locations.push(location);
    }
    Ok(locations)
}

/// Chiba city, used when the CLI is given no location.
pub fn default_location() -> Location {
    Location {
        prefecture: "千葉県".to_string(),
        city: "千葉市".to_string(),
        lat: 35.632896,
        lon: 140.038996,
        code: Some("120010".to_string()),
    }
}
