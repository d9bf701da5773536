//! Turns provider observations into display-ready conditions.

use crate::model::{Conditions, Observation};

/// Fixed French labels for the provider's primary condition keywords.
const CONDITION_LABELS: &[(&str, &str)] = &[
    ("Clear", "Ensoleillé"),
    ("Clouds", "Nuageux"),
    ("Rain", "Pluvieux"),
    ("Drizzle", "Bruine"),
    ("Thunderstorm", "Orageux"),
    ("Snow", "Neigeux"),
    ("Mist", "Brumeux"),
    ("Fog", "Brouillard"),
];

/// Localized label for a condition keyword; unknown keywords come back unchanged.
pub fn translate_condition(keyword: &str) -> &str {
    CONDITION_LABELS
        .iter()
        .find(|(k, _)| *k == keyword)
        .map_or(keyword, |&(_, label)| label)
}

/// m/s to km/h, rounded.
pub fn mps_to_kmh(speed_mps: f64) -> i32 {
    (speed_mps * 3.6).round() as i32
}

/// Nearest whole degree, halves away from zero.
pub fn round_temperature(celsius: f64) -> i32 {
    celsius.round() as i32
}

pub fn normalize(observation: Observation) -> Conditions {
    Conditions {
        temperature: round_temperature(observation.temperature_c),
        humidity: observation.humidity_pct,
        condition: translate_condition(&observation.condition).to_string(),
        wind_speed_kmh: mps_to_kmh(observation.wind_speed_mps),
        precipitation_mm: observation.precipitation_mm,
        cloud_cover_percent: observation.cloud_cover_pct,
        location: observation.place,
        observed_at: observation.observed_at,
    }
}
