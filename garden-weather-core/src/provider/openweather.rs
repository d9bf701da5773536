use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::DEFAULT_WEATHER_URL,
    error::ProviderError,
    model::{Observation, Place, Position},
};

use super::WeatherProvider;

/// OpenWeatherMap current weather by coordinates, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<OpenWeatherProvider> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(OpenWeatherProvider {
            api_key: self.api_key,
            base_url: self.base_url,
            http,
        })
    }
}

impl OpenWeatherProvider {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherBuilder {
        OpenWeatherBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_WEATHER_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    async fn fetch_current(&self, position: Position) -> Result<Observation, ProviderError> {
        tracing::debug!(
            lat = position.latitude,
            lon = position.longitude,
            "Requesting OpenWeather current conditions"
        );

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("lat", position.latitude), ("lon", position.longitude)])
            .query(&[("units", "metric"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                ProviderError::Unreachable(format!("request to OpenWeather failed: {e}"))
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather current request failed"
            );
            return Err(ProviderError::Http { status: status.as_u16() });
        }

        let body = res.text().await.map_err(|e| {
            ProviderError::Unreachable(format!("failed to read OpenWeather response body: {e}"))
        })?;

        parse_current(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    rain: Option<OwRain>,
    clouds: Option<OwClouds>,
    name: Option<String>,
    sys: Option<OwSys>,
    dt: Option<i64>,
}

impl OwCurrentResponse {
    fn into_observation(self) -> Result<Observation, ProviderError> {
        let main = self
            .main
            .ok_or_else(|| ProviderError::Data("response has no `main` block".to_string()))?;

        let condition = self
            .weather
            .into_iter()
            .next()
            .map(|w| w.main)
            .ok_or_else(|| {
                ProviderError::Data("response has an empty `weather` list".to_string())
            })?;

        let wind = self
            .wind
            .ok_or_else(|| ProviderError::Data("response has no `wind` block".to_string()))?;

        let place = self.name.filter(|n| !n.is_empty()).map(|city| Place {
            city,
            country: self.sys.and_then(|s| s.country).unwrap_or_default(),
        });

        Ok(Observation {
            temperature_c: main.temp,
            humidity_pct: main.humidity,
            condition,
            wind_speed_mps: wind.speed,
            precipitation_mm: self.rain.and_then(|r| r.one_hour),
            cloud_cover_pct: self.clouds.and_then(|c| c.all),
            place,
            observed_at: self.dt.and_then(unix_to_utc),
        })
    }
}

fn parse_current(body: &str) -> Result<Observation, ProviderError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Data(format!("failed to parse OpenWeather JSON: {e}")))?;

    parsed.into_observation()
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_conditions(&self, position: Position) -> Result<Observation, ProviderError> {
        self.fetch_current(position).await
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
