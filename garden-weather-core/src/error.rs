use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ACCESS_PROMPT: &str = "Autorisez l'accès à votre position pour afficher la météo";
pub const GEOLOCATION_UNSUPPORTED: &str =
    "La géolocalisation n'est pas prise en charge sur cet appareil";
pub const LOAD_FAILED: &str = "Impossible de charger la météo";

/// Failures of a position provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("Geolocation is not supported on this device")]
    Unsupported,

    #[error("User denied the location permission request")]
    PermissionDenied,

    #[error("Timed out after {0:?} waiting for the device position")]
    Timeout(Duration),

    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// Failures of a weather provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Weather API error: {status}")]
    Http { status: u16 },

    #[error("Malformed weather payload: {0}")]
    Data(String),

    #[error("Weather API unreachable: {0}")]
    Unreachable(String),
}

/// Everything that can end a resolution cycle without a snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("Geolocation is not supported on this device")]
    UnsupportedCapability,

    #[error(transparent)]
    PositionUnavailable(PositionError),

    #[error("Weather API error: {status}")]
    ProviderHttpError { status: u16 },

    #[error("Malformed weather payload: {0}")]
    ProviderDataError(String),

    #[error("Weather API unreachable: {0}")]
    ProviderUnreachable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnsupportedCapability,
    PositionUnavailable,
    ProviderHttpError,
    ProviderDataError,
    ProviderUnreachable,
}

impl ResolveError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ResolveError::UnsupportedCapability => FailureKind::UnsupportedCapability,
            ResolveError::PositionUnavailable(_) => FailureKind::PositionUnavailable,
            ResolveError::ProviderHttpError { .. } => FailureKind::ProviderHttpError,
            ResolveError::ProviderDataError(_) => FailureKind::ProviderDataError,
            ResolveError::ProviderUnreachable(_) => FailureKind::ProviderUnreachable,
        }
    }

    /// Text shown in place of the condition label.
    ///
    /// Typed position failures decide directly. Free-text details from a
    /// provider that could not tag its failure fall back to keyword matching.
    pub fn user_message(&self) -> &'static str {
        match self {
            ResolveError::UnsupportedCapability => GEOLOCATION_UNSUPPORTED,
            ResolveError::PositionUnavailable(PositionError::PermissionDenied) => ACCESS_PROMPT,
            ResolveError::PositionUnavailable(PositionError::Unavailable(detail)) => {
                classify_detail(detail)
            }
            _ => LOAD_FAILED,
        }
    }
}

/// Picks the user-facing message from an untyped failure detail.
pub fn classify_detail(detail: &str) -> &'static str {
    if detail.contains("permission") {
        ACCESS_PROMPT
    } else if detail.contains("Geolocation") {
        GEOLOCATION_UNSUPPORTED
    } else {
        LOAD_FAILED
    }
}

impl From<PositionError> for ResolveError {
    fn from(value: PositionError) -> Self {
        match value {
            PositionError::Unsupported => ResolveError::UnsupportedCapability,
            other => ResolveError::PositionUnavailable(other),
        }
    }
}

impl From<ProviderError> for ResolveError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::Http { status } => ResolveError::ProviderHttpError { status },
            ProviderError::Data(detail) => ResolveError::ProviderDataError(detail),
            ProviderError::Unreachable(detail) => ResolveError::ProviderUnreachable(detail),
        }
    }
}
