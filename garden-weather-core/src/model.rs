use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, ResolveError};

/// Device coordinates for one resolution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude in -90..=90 and longitude in -180..=180, both finite.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub city: String,
    pub country: String,
}

/// Provider-neutral measurements, before rounding and translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub condition: String,
    pub wind_speed_mps: f64,
    pub precipitation_mm: Option<f64>,
    pub cloud_cover_pct: Option<u8>,
    pub place: Option<Place>,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Normalized, display-ready current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditions {
    pub temperature: i32,
    pub humidity: u8,
    pub condition: String,
    pub wind_speed_kmh: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Place>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Result of a failed cycle: a message for the user plus the underlying detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSnapshot {
    pub condition: String,
    pub error: String,
    pub kind: FailureKind,
}

/// What the presentation layer renders. Either every measurement is present
/// or none is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeatherSnapshot {
    Ready(Conditions),
    Failed(FailedSnapshot),
}

impl WeatherSnapshot {
    pub fn failed(err: &ResolveError) -> Self {
        WeatherSnapshot::Failed(FailedSnapshot {
            condition: err.user_message().to_string(),
            error: err.to_string(),
            kind: err.kind(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, WeatherSnapshot::Failed(_))
    }

    pub fn conditions(&self) -> Option<&Conditions> {
        match self {
            WeatherSnapshot::Ready(c) => Some(c),
            WeatherSnapshot::Failed(_) => None,
        }
    }

    /// Localized label when populated, user-facing message otherwise.
    pub fn condition(&self) -> &str {
        match self {
            WeatherSnapshot::Ready(c) => &c.condition,
            WeatherSnapshot::Failed(f) => &f.condition,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            WeatherSnapshot::Ready(_) => None,
            WeatherSnapshot::Failed(f) => Some(&f.error),
        }
    }

    pub fn temperature(&self) -> Option<i32> {
        self.conditions().map(|c| c.temperature)
    }

    pub fn humidity(&self) -> Option<u8> {
        self.conditions().map(|c| c.humidity)
    }

    pub fn wind_speed_kmh(&self) -> Option<i32> {
        self.conditions().map(|c| c.wind_speed_kmh)
    }
}

impl From<Conditions> for WeatherSnapshot {
    fn from(value: Conditions) -> Self {
        WeatherSnapshot::Ready(value)
    }
}
