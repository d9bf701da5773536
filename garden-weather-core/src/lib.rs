//! Core library for the garden assistant's weather panel.
//!
//! This crate defines:
//! - Configuration (API key, position source, refresh interval)
//! - Position and weather provider abstractions
//! - Normalization into display-ready snapshots
//! - The resolver and its periodic refresh loop
//!
//! It is used by `garden-weather-cli`, but any presentation layer can drive
//! [`WeatherResolver::resolve`] or a [`RefreshLoop`] directly.

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod position;
pub mod provider;
pub mod refresh;
pub mod resolver;
pub mod watering;

pub use config::Config;
pub use error::{FailureKind, PositionError, ProviderError, ResolveError};
pub use model::{Conditions, FailedSnapshot, Observation, Place, Position, WeatherSnapshot};
pub use position::{FixedPosition, IpGeolocation, NoGeolocation, PositionProvider, PositionSource};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use refresh::{RefreshHandle, RefreshLoop};
pub use resolver::WeatherResolver;
pub use watering::{WateringAdvice, WateringReason};
