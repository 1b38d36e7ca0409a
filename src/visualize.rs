//! Leaflet map of per-location agreement.
//!
//! Each location becomes a circle marker coloured by the mean of its
//! sources' deviation scores. A location without scores is drawn gray.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyzers::band::{Band, band};
use crate::pipeline::LocationReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub prefecture: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub score: Option<f64>,
    pub band: Band,
    pub color: &'static str,
}

pub fn map_points(reports: &BTreeMap<String, LocationReport>) -> Vec<MapPoint> {
    reports
        .values()
        .map(|r| {
            let score = r.deviation.average_score();
            let band = band(score);
            MapPoint {
                prefecture: r.location.prefecture.clone(),
                city: r.location.city.clone(),
                lat: r.location.lat,
                lon: r.location.lon,
                score,
                band,
                color: band.color(),
            }
        })
        .collect()
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8" />
    <title>Weather Forecast Deviation Map</title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <style>#map { height: 100vh; }</style>
</head>
<body>
<div id="map"></div>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script>
    var map = L.map('map').setView([36.2048, 138.2529], 5);
    L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', { maxZoom: 18 }).addTo(map);

    var data = __POINTS__;

    data.forEach(function(p) {
        var circle = L.circleMarker([p.lat, p.lon], {
            radius: 8,
            fillColor: p.color,
            color: '#000',
            weight: 1,
            opacity: 1,
            fillOpacity: 0.8
        }).addTo(map);

        var score = (p.score === null || p.score === undefined) ? 'N/A' : p.score.toFixed(2);
        circle.bindPopup('地点: ' + p.prefecture + ' ' + p.city + '<br>スコア: ' + score);
    });
</script>
</body>
</html>
"#;

/// Renders the points into a standalone HTML page.
pub fn render_map(points: &[MapPoint]) -> Result<String> {
    // `</` inside a JSON string would end the script element early.
    let json = serde_json::to_string(points)?.replace("</", "<\\/");
    Ok(TEMPLATE.replace("__POINTS__", &json))
}

/// Writes the map to `path`, or to a timestamped file in the system temp
/// directory. Returns the path written.
pub fn write_map(points: &[MapPoint], path: Option<&Path>) -> Result<PathBuf> {
    let html = render_map(points)?;
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::temp_dir().join(format!(
            "forecast_map_{}.html",
            Local::now().format("%Y%m%d_%H%M%S")
        )),
    };
    std::fs::write(&path, html).with_context(|| format!("writing map to {}", path.display()))?;
    info!(path = %path.display(), points = points.len(), "Map written");
    Ok(path)
}
