//! Payloads returned when an operation cannot complete.

use crate::types::{LocationMarker, MetricsSnapshot};

/// Ten world cities shown when marker discovery fails outright.
pub fn default_markers() -> Vec<LocationMarker> {
    vec![
        LocationMarker::new("New York", -74.006, 40.7128),
        LocationMarker::new("London", -0.1276, 51.5074),
        LocationMarker::new("Tokyo", 139.6917, 35.6895),
        LocationMarker::new("Paris", 2.3522, 48.8566),
        LocationMarker::new("Sydney", 151.2093, -33.8688),
        LocationMarker::new("Los Angeles", -118.2437, 34.0522),
        LocationMarker::new("Berlin", 13.405, 52.52),
        LocationMarker::new("Toronto", -79.3832, 43.6532),
        LocationMarker::new("São Paulo", -46.6333, -23.5505),
        LocationMarker::new("Mumbai", 72.8777, 19.076),
    ]
}

pub fn apology(message: &str) -> String {
    format!(
        "I'm sorry, I couldn't process your question about \"{message}\" right now. \
         Please try again in a moment."
    )
}

pub fn default_metrics() -> MetricsSnapshot {
    MetricsSnapshot::zeroed()
}
