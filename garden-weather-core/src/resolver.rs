use std::{sync::Arc, time::Duration};

use tracing::instrument;

use crate::{
    Config, Conditions, WeatherSnapshot,
    error::{PositionError, ResolveError},
    normalize::normalize,
    position::{PositionProvider, position_from_config},
    provider::{WeatherProvider, provider_from_config},
};

pub const DEFAULT_POSITION_TIMEOUT: Duration = Duration::from_secs(10);

/// Position → weather → normalized snapshot. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct WeatherResolver {
    position: Arc<dyn PositionProvider>,
    weather: Arc<dyn WeatherProvider>,
    position_timeout: Duration,
}

impl WeatherResolver {
    pub fn new(position: Arc<dyn PositionProvider>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self {
            position,
            weather,
            position_timeout: DEFAULT_POSITION_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let position: Arc<dyn PositionProvider> = position_from_config(config)?.into();
        let weather: Arc<dyn WeatherProvider> = provider_from_config(config)?.into();

        Ok(Self::new(position, weather).with_position_timeout(config.position_timeout()))
    }

    pub fn with_position_timeout(mut self, timeout: Duration) -> Self {
        self.position_timeout = timeout;
        self
    }

    /// One resolution cycle. Failures come back as an error snapshot.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> WeatherSnapshot {
        match self.try_resolve().await {
            Ok(conditions) => WeatherSnapshot::Ready(conditions),
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), error = %err, "Weather resolution failed");
                WeatherSnapshot::failed(&err)
            }
        }
    }

    /// One resolution cycle with the typed failure.
    pub async fn try_resolve(&self) -> Result<Conditions, ResolveError> {
        let bound = self.position_timeout;
        let position = tokio::time::timeout(bound, self.position.current_position(bound))
            .await
            .map_err(|_| PositionError::Timeout(bound))??;

        tracing::debug!(lat = position.latitude, lon = position.longitude, "Position acquired");

        let observation = self.weather.current_conditions(position).await?;
        let conditions = normalize(observation);

        tracing::info!(
            temperature = conditions.temperature,
            condition = %conditions.condition,
            "Weather resolved"
        );
        Ok(conditions)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        Observation, Position,
        error::{ACCESS_PROMPT, FailureKind, GEOLOCATION_UNSUPPORTED, LOAD_FAILED, ProviderError},
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    pub(crate) struct FakePosition {
        pub result: Result<Position, PositionError>,
        pub delay: Duration,
    }

    impl FakePosition {
        pub fn at(lat: f64, lon: f64) -> Self {
            Self { result: Ok(Position::new(lat, lon)), delay: Duration::ZERO }
        }

        pub fn failing(err: PositionError) -> Self {
            Self { result: Err(err), delay: Duration::ZERO }
        }
    }

    #[async_trait]
    impl PositionProvider for FakePosition {
        async fn current_position(&self, _timeout: Duration) -> Result<Position, PositionError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }
    }

    #[derive(Debug)]
    pub(crate) struct FakeWeather {
        pub result: Result<Observation, ProviderError>,
        pub delay: Duration,
        pub calls: AtomicUsize,
    }

    impl FakeWeather {
        pub fn ok(observation: Observation) -> Self {
            Self { result: Ok(observation), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        pub fn failing(err: ProviderError) -> Self {
            Self { result: Err(err), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn current_conditions(
            &self,
            _position: Position,
        ) -> Result<Observation, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }
    }

    pub(crate) fn clear_sky() -> Observation {
        Observation {
            temperature_c: 21.6,
            humidity_pct: 60,
            condition: "Clear".to_string(),
            wind_speed_mps: 5.0,
            precipitation_mm: None,
            cloud_cover_pct: Some(0),
            place: None,
            observed_at: None,
        }
    }

    fn resolver(position: FakePosition, weather: FakeWeather) -> WeatherResolver {
        WeatherResolver::new(Arc::new(position), Arc::new(weather))
    }

    #[tokio::test]
    async fn resolves_and_normalizes() {
        let snapshot = resolver(FakePosition::at(45.75, 4.85), FakeWeather::ok(clear_sky()))
            .resolve()
            .await;

        assert!(!snapshot.is_error());
        assert_eq!(snapshot.temperature(), Some(22));
        assert_eq!(snapshot.humidity(), Some(60));
        assert_eq!(snapshot.wind_speed_kmh(), Some(18));
        assert_eq!(snapshot.condition(), "Ensoleillé");
        assert_eq!(snapshot.error(), None);
    }

    #[tokio::test]
    async fn permission_denied_yields_access_prompt() {
        let weather = Arc::new(FakeWeather::ok(clear_sky()));
        let resolver = WeatherResolver::new(
            Arc::new(FakePosition::failing(PositionError::PermissionDenied)),
            weather.clone(),
        );

        let snapshot = resolver.resolve().await;

        assert!(snapshot.is_error());
        assert_eq!(snapshot.condition(), ACCESS_PROMPT);
        assert!(snapshot.error().is_some_and(|e| e.contains("permission")));
        assert_eq!(snapshot.temperature(), None);
        assert_eq!(snapshot.humidity(), None);
        assert_eq!(weather.calls(), 0, "no weather request without a position");
    }

    #[tokio::test]
    async fn missing_capability_yields_unsupported_message() {
        let snapshot = resolver(
            FakePosition::failing(PositionError::Unsupported),
            FakeWeather::ok(clear_sky()),
        )
        .resolve()
        .await;

        assert_eq!(snapshot.condition(), GEOLOCATION_UNSUPPORTED);
        match snapshot {
            WeatherSnapshot::Failed(f) => assert_eq!(f.kind, FailureKind::UnsupportedCapability),
            WeatherSnapshot::Ready(_) => panic!("expected an error snapshot"),
        }
    }

    #[tokio::test]
    async fn http_failure_becomes_error_snapshot() {
        let snapshot = resolver(
            FakePosition::at(45.75, 4.85),
            FakeWeather::failing(ProviderError::Http { status: 401 }),
        )
        .resolve()
        .await;

        assert_eq!(snapshot.condition(), LOAD_FAILED);
        assert_eq!(snapshot.error(), Some("Weather API error: 401"));
        assert_eq!(snapshot.temperature(), None);
    }

    #[tokio::test]
    async fn data_failure_is_classified() {
        let err = resolver(
            FakePosition::at(45.75, 4.85),
            FakeWeather::failing(ProviderError::Data("response has no `main` block".into())),
        )
        .try_resolve()
        .await
        .unwrap_err();

        assert_eq!(err.kind(), FailureKind::ProviderDataError);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_position_times_out() {
        let slow = FakePosition {
            result: Ok(Position::new(45.75, 4.85)),
            delay: Duration::from_secs(60),
        };
        let resolver = resolver(slow, FakeWeather::ok(clear_sky()))
            .with_position_timeout(Duration::from_secs(10));

        let err = resolver.try_resolve().await.unwrap_err();
        assert_eq!(
            err,
            ResolveError::PositionUnavailable(PositionError::Timeout(Duration::from_secs(10)))
        );
        assert_eq!(err.user_message(), LOAD_FAILED);
    }

    #[tokio::test]
    async fn repeated_resolution_is_idempotent() {
        let resolver = resolver(FakePosition::at(45.75, 4.85), FakeWeather::ok(clear_sky()));

        let first = resolver.resolve().await;
        let second = resolver.resolve().await;
        assert_eq!(first, second);
    }
}
