use serde::{Deserialize, Serialize};

use crate::{Conditions, WeatherSnapshot};

const RAIN_SUFFICIENT_MM: f64 = 5.0;
const HUMIDITY_HIGH_PCT: u8 = 80;
const TEMPERATURE_HIGH_C: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WateringReason {
    RecentRainfall,
    HighHumidity,
    HighTemperature,
    Regular,
}

impl WateringReason {
    pub fn label(&self) -> &'static str {
        match self {
            WateringReason::RecentRainfall => "Pluie récente suffisante",
            WateringReason::HighHumidity => "Humidité élevée, arrosage inutile",
            WateringReason::HighTemperature => "Forte chaleur, arrosage nécessaire",
            WateringReason::Regular => "Arrosage habituel recommandé",
        }
    }
}

/// Whether the garden needs watering given the current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WateringAdvice {
    pub water: bool,
    pub reason: WateringReason,
}

impl WateringAdvice {
    /// `None` for an error snapshot.
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Option<Self> {
        snapshot.conditions().map(Self::from_conditions)
    }

    pub fn from_conditions(conditions: &Conditions) -> Self {
        let (water, reason) = if conditions.precipitation_mm.unwrap_or(0.0) > RAIN_SUFFICIENT_MM {
            (false, WateringReason::RecentRainfall)
        } else if conditions.humidity > HUMIDITY_HIGH_PCT {
            (false, WateringReason::HighHumidity)
        } else if conditions.temperature > TEMPERATURE_HIGH_C {
            (true, WateringReason::HighTemperature)
        } else {
            (true, WateringReason::Regular)
        };

        Self { water, reason }
    }
}
