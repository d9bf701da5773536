use crate::{
    Config, Observation, Position, error::ProviderError, provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Current conditions by coordinates.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_conditions(&self, position: Position) -> Result<Observation, ProviderError>;
}

/// Construct the weather provider from config.
///
/// A missing API key is not an error here: the request goes out with an
/// empty `appid` and the provider's 401 surfaces through the snapshot.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    if !config.has_api_key() {
        tracing::warn!(
            "No weather API key configured; set {} or run `garden-weather configure`",
            crate::config::API_KEY_ENV
        );
    }

    let provider = OpenWeatherProvider::builder(config.api_key().unwrap_or_default())
        .base_url(&config.weather.base_url)
        .timeout(config.request_timeout())
        .build()?;

    Ok(Box::new(provider))
}
