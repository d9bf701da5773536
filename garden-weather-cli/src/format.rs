//! Output formatting for CLI display.

use chrono::Local;
use garden_weather_core::{Conditions, WateringAdvice, WeatherSnapshot};

/// Format a snapshot the way the dashboard weather card shows it.
pub(crate) fn format_snapshot(snapshot: &WeatherSnapshot) -> String {
    match snapshot {
        WeatherSnapshot::Ready(c) => format_conditions(c),
        WeatherSnapshot::Failed(f) => format!("Météo\n  {}\n  ({})", f.condition, f.error),
    }
}

fn format_conditions(c: &Conditions) -> String {
    let mut out = match &c.location {
        Some(place) if !place.country.is_empty() => {
            format!("Météo ({}, {})\n", place.city, place.country)
        }
        Some(place) => format!("Météo ({})\n", place.city),
        None => "Météo\n".to_string(),
    };

    out.push_str(&format!("  {}°C, {}\n", c.temperature, c.condition));
    out.push_str(&format!("  Humidité : {}%\n", c.humidity));
    out.push_str(&format!("  Vent : {} km/h", c.wind_speed_kmh));

    if let Some(mm) = c.precipitation_mm {
        out.push_str(&format!("\n  Précipitations : {mm:.1} mm"));
    }
    if let Some(pct) = c.cloud_cover_percent {
        out.push_str(&format!("\n  Couverture nuageuse : {pct}%"));
    }
    if let Some(at) = c.observed_at {
        out.push_str(&format!("\n  Relevé à {}", at.with_timezone(&Local).format("%H:%M")));
    }

    out
}

pub(crate) fn format_advice(advice: Option<&WateringAdvice>) -> String {
    match advice {
        Some(a) if a.water => format!("Arroser : oui ({})", a.reason.label()),
        Some(a) => format!("Arroser : non ({})", a.reason.label()),
        None => "Arroser : conseil indisponible sans données météo".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_weather_core::{Place, ResolveError, WateringReason};

    fn conditions() -> Conditions {
        Conditions {
            temperature: 22,
            humidity: 60,
            condition: "Ensoleillé".into(),
            wind_speed_kmh: 18,
            precipitation_mm: None,
            cloud_cover_percent: None,
            location: Some(Place { city: "Lyon".into(), country: "FR".into() }),
            observed_at: None,
        }
    }

    #[test]
    fn ready_snapshot_shows_card_lines() {
        let text = format_snapshot(&WeatherSnapshot::Ready(conditions()));
        assert!(text.contains("Météo (Lyon, FR)"));
        assert!(text.contains("22°C, Ensoleillé"));
        assert!(text.contains("Humidité : 60%"));
        assert!(text.contains("Vent : 18 km/h"));
        assert!(!text.contains("Précipitations"));
    }

    #[test]
    fn failed_snapshot_shows_message_and_detail() {
        let snapshot = WeatherSnapshot::failed(&ResolveError::ProviderHttpError { status: 401 });
        let text = format_snapshot(&snapshot);
        assert!(text.contains("Impossible de charger la météo"));
        assert!(text.contains("401"));
    }

    #[test]
    fn advice_lines() {
        let yes = WateringAdvice { water: true, reason: WateringReason::HighTemperature };
        assert!(format_advice(Some(&yes)).starts_with("Arroser : oui"));

        let no = WateringAdvice { water: false, reason: WateringReason::RecentRainfall };
        assert!(format_advice(Some(&no)).starts_with("Arroser : non"));

        assert!(format_advice(None).contains("indisponible"));
    }
}
