//! Sources of device coordinates.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug, time::Duration};

use crate::{Config, Position, error::PositionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSource {
    /// Coordinates stored in the config file.
    Fixed,
    /// Approximate coordinates from an IP geolocation service.
    Ip,
    /// No geolocation capability.
    None,
}

impl PositionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSource::Fixed => "fixed",
            PositionSource::Ip => "ip",
            PositionSource::None => "none",
        }
    }

    pub const fn all() -> &'static [PositionSource] {
        &[PositionSource::Fixed, PositionSource::Ip, PositionSource::None]
    }
}

impl std::fmt::Display for PositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PositionSource {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "fixed" => Ok(PositionSource::Fixed),
            "ip" => Ok(PositionSource::Ip),
            "none" => Ok(PositionSource::None),
            _ => Err(anyhow::anyhow!(
                "Unknown position source '{value}'. Supported sources: fixed, ip, none."
            )),
        }
    }
}

/// Device position capability.
#[async_trait]
pub trait PositionProvider: Send + Sync + Debug {
    /// Current coordinates. Implementations should give up after `timeout`;
    /// the resolver enforces the bound regardless.
    async fn current_position(&self, timeout: Duration) -> Result<Position, PositionError>;
}

#[derive(Debug, Clone)]
pub struct FixedPosition {
    position: Position,
}

impl FixedPosition {
    pub fn new(latitude: f64, longitude: f64) -> anyhow::Result<Self> {
        let position = Position::new(latitude, longitude);
        if !position.is_valid() {
            anyhow::bail!(
                "Invalid coordinates ({latitude}, {longitude}): latitude must be -90 to 90, \
                 longitude must be -180 to 180"
            );
        }
        Ok(Self { position })
    }
}

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn current_position(&self, _timeout: Duration) -> Result<Position, PositionError> {
        Ok(self.position)
    }
}

/// Stand-in for environments without any geolocation capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl PositionProvider for NoGeolocation {
    async fn current_position(&self, _timeout: Duration) -> Result<Position, PositionError> {
        Err(PositionError::Unsupported)
    }
}

/// Approximate position from the public IP address (ipapi.co format).
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

impl IpGeolocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl PositionProvider for IpGeolocation {
    async fn current_position(&self, timeout: Duration) -> Result<Position, PositionError> {
        tracing::debug!(url = %self.url, "Looking up position from IP address");

        let res = self
            .http
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PositionError::Timeout(timeout)
                } else {
                    PositionError::Unavailable(format!("IP lookup request failed: {e}"))
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(PositionError::Unavailable(format!(
                "IP lookup failed with status {status}"
            )));
        }

        let parsed: IpApiResponse = res
            .json()
            .await
            .map_err(|e| PositionError::Unavailable(format!("Invalid IP lookup response: {e}")))?;

        if parsed.error {
            return Err(PositionError::Unavailable(format!(
                "IP lookup refused: {}",
                parsed.reason.as_deref().unwrap_or("unknown reason")
            )));
        }

        match (parsed.latitude, parsed.longitude) {
            (Some(latitude), Some(longitude)) => {
                let position = Position::new(latitude, longitude);
                if position.is_valid() {
                    Ok(position)
                } else {
                    Err(PositionError::Unavailable(format!(
                        "IP lookup returned out-of-range coordinates ({latitude}, {longitude})"
                    )))
                }
            }
            _ => Err(PositionError::Unavailable(
                "IP lookup response has no coordinates".to_string(),
            )),
        }
    }
}

/// Construct the position provider selected in config.
pub fn position_from_config(config: &Config) -> anyhow::Result<Box<dyn PositionProvider>> {
    let settings = &config.position;

    let boxed: Box<dyn PositionProvider> = match settings.source {
        PositionSource::Fixed => {
            let (Some(lat), Some(lon)) = (settings.latitude, settings.longitude) else {
                anyhow::bail!(
                    "Position source is 'fixed' but latitude/longitude are not set.\n\
                     Hint: run `garden-weather configure` or pass --lat/--lon."
                );
            };
            Box::new(FixedPosition::new(lat, lon)?)
        }
        PositionSource::Ip => Box::new(IpGeolocation::new(settings.ip_lookup_url.clone())),
        PositionSource::None => Box::new(NoGeolocation),
    };

    Ok(boxed)
}
