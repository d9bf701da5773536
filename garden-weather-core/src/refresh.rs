//! Periodic re-resolution for a presentation layer.
//!
//! The loop resolves once immediately and then on a fixed interval, keeping
//! only the latest snapshot. A tick that fires while the previous cycle is
//! still running is skipped. Stopping the loop never aborts a running cycle;
//! its result is still published.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{WeatherResolver, WeatherSnapshot};

#[derive(Debug)]
pub struct RefreshLoop;

impl RefreshLoop {
    /// Start polling on the current tokio runtime. `interval` must be non-zero.
    pub fn spawn(resolver: Arc<WeatherResolver>, interval: Duration) -> RefreshHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (stop_tx, stop_rx) = oneshot::channel();
        let skipped = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(run(
            resolver,
            interval,
            Arc::new(snapshot_tx),
            stop_rx,
            skipped.clone(),
        ));

        RefreshHandle {
            latest: snapshot_rx,
            stop: Some(stop_tx),
            task,
            skipped,
        }
    }
}

async fn run(
    resolver: Arc<WeatherResolver>,
    interval: Duration,
    publish: Arc<watch::Sender<Option<WeatherSnapshot>>>,
    mut stop: oneshot::Receiver<()>,
    skipped: Arc<AtomicU64>,
) {
    let in_flight = Arc::new(AtomicBool::new(false));
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // A dropped handle also ends the loop.
            _ = &mut stop => break,
            _ = ticker.tick() => {
                if in_flight.swap(true, Ordering::AcqRel) {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Previous weather refresh still running, skipping this tick");
                    continue;
                }

                let resolver = resolver.clone();
                let publish = publish.clone();
                let guard = InFlight(in_flight.clone());
                tokio::spawn(async move {
                    let _guard = guard;
                    let snapshot = resolver.resolve().await;
                    publish.send_replace(Some(snapshot));
                });
            }
        }
    }

    tracing::debug!("Weather refresh loop stopped");
}

/// Clears the in-flight flag when a cycle ends, including by panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner side of a running [`RefreshLoop`].
#[derive(Debug)]
pub struct RefreshHandle {
    latest: watch::Receiver<Option<WeatherSnapshot>>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    skipped: Arc<AtomicU64>,
}

impl RefreshHandle {
    /// Most recent snapshot, if any cycle has finished yet.
    pub fn latest(&self) -> Option<WeatherSnapshot> {
        self.latest.borrow().clone()
    }

    /// A receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<WeatherSnapshot>> {
        self.latest.clone()
    }

    /// Number of ticks skipped because a cycle was still in flight.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Stop scheduling new cycles and wait for the timer loop to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = self.task.await {
            tracing::warn!("Weather refresh loop ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Observation, Position, WeatherProvider,
        error::ProviderError,
        resolver::tests::{FakePosition, FakeWeather, clear_sky},
    };
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Panics on its first call, then answers normally.
    #[derive(Debug, Default)]
    struct PanicsOnce {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for PanicsOnce {
        async fn current_conditions(
            &self,
            _position: Position,
        ) -> Result<Observation, ProviderError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("provider blew up");
            }
            Ok(clear_sky())
        }
    }

    fn spawn_with(weather: Arc<FakeWeather>, interval: Duration) -> RefreshHandle {
        let resolver = WeatherResolver::new(Arc::new(FakePosition::at(45.75, 4.85)), weather);
        RefreshLoop::spawn(Arc::new(resolver), interval)
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_immediately_then_on_interval() {
        let weather = Arc::new(FakeWeather::ok(clear_sky()));
        let handle = spawn_with(weather.clone(), Duration::from_secs(1800));

        let mut rx = handle.subscribe();
        rx.changed().await.expect("first snapshot");
        assert_eq!(weather.calls(), 1);
        assert_eq!(handle.latest().and_then(|s| s.temperature()), Some(22));

        tokio::time::sleep(Duration::from_secs(1800 * 2 + 1)).await;
        assert_eq!(weather.calls(), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn skips_ticks_while_a_cycle_is_in_flight() {
        let weather = Arc::new(FakeWeather {
            delay: Duration::from_secs(25),
            ..FakeWeather::ok(clear_sky())
        });
        let handle = spawn_with(weather.clone(), Duration::from_secs(10));

        // Ticks at 0, 10, 20, 30: the first cycle runs until 25.
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(weather.calls(), 2);
        assert_eq!(handle.skipped_ticks(), 2);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_lets_the_running_cycle_publish() {
        let weather = Arc::new(FakeWeather {
            delay: Duration::from_secs(5),
            ..FakeWeather::ok(clear_sky())
        });
        let handle = spawn_with(weather.clone(), Duration::from_secs(60));
        let mut rx = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(weather.calls(), 1);
        handle.stop().await;

        rx.changed().await.expect("in-flight cycle still publishes");
        assert!(rx.borrow().as_ref().is_some_and(|s| !s.is_error()));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(weather.calls(), 1, "no new cycles after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_cycle_does_not_block_later_ticks() {
        let weather = Arc::new(PanicsOnce::default());
        let resolver =
            WeatherResolver::new(Arc::new(FakePosition::at(45.75, 4.85)), weather.clone());
        let handle = RefreshLoop::spawn(Arc::new(resolver), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(weather.calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.skipped_ticks(), 0);
        assert!(handle.latest().is_some_and(|s| !s.is_error()));
        handle.stop().await;
    }
}
