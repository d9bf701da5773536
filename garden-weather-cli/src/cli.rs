use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use garden_weather_core::{
    Config, PositionSource, RefreshLoop, WateringAdvice, WeatherResolver, WeatherSnapshot,
};
use inquire::{CustomType, Password, PasswordDisplayMode, Select};

use crate::format::{format_advice, format_snapshot};

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "garden-weather", version, about = "Weather panel of the garden assistant")]
pub struct Cli {
    /// Latitude to use instead of the configured position source.
    #[arg(long, global = true, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to use instead of the configured position source.
    #[arg(long, global = true, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and position source.
    Configure,

    /// Resolve the current weather once.
    Show {
        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep refreshing the weather until interrupted.
    Watch {
        /// Refresh interval in minutes; defaults to the configured interval.
        #[arg(long)]
        interval_mins: Option<u64>,
    },

    /// Tell whether the garden needs watering now.
    Advice,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { json } => {
                let config = load_config(self.lat, self.lon)?;
                let snapshot = WeatherResolver::from_config(&config)?.resolve().await;

                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&snapshot)
                            .context("Failed to serialize snapshot")?
                    );
                } else {
                    println!("{}", format_snapshot(&snapshot));
                }
                Ok(())
            }
            Command::Watch { interval_mins } => {
                let config = load_config(self.lat, self.lon)?;
                let interval = refresh_interval(&config, interval_mins)?;
                watch(&config, interval).await
            }
            Command::Advice => {
                let config = load_config(self.lat, self.lon)?;
                let snapshot = WeatherResolver::from_config(&config)?.resolve().await;
                let advice = WateringAdvice::from_snapshot(&snapshot);

                println!("{}", format_snapshot(&snapshot));
                println!("{}", format_advice(advice.as_ref()));
                Ok(())
            }
        }
    }
}

/// Config file, then environment, then command-line coordinates.
fn load_config(lat: Option<f64>, lon: Option<f64>) -> anyhow::Result<Config> {
    let config = Config::load()?.with_env_overrides();
    Ok(apply_position_override(config, lat, lon))
}

/// Both coordinates given on the command line pin the position source to `fixed`.
fn apply_position_override(mut config: Config, lat: Option<f64>, lon: Option<f64>) -> Config {
    if let (Some(lat), Some(lon)) = (lat, lon) {
        tracing::debug!(
            configured = %config.position.source,
            lat,
            lon,
            "Command-line coordinates override the position source"
        );
        config.set_fixed_position(lat, lon);
    }
    config
}

fn refresh_interval(config: &Config, interval_mins: Option<u64>) -> anyhow::Result<Duration> {
    let interval = interval_mins
        .map(|m| Duration::from_secs(m.saturating_mul(60)))
        .unwrap_or_else(|| config.refresh_interval());

    if interval < MIN_REFRESH_INTERVAL {
        anyhow::bail!("Refresh interval must be at least one minute");
    }
    if interval > MAX_REFRESH_INTERVAL {
        anyhow::bail!("Refresh interval must be at most 24 hours");
    }
    Ok(interval)
}

async fn watch(config: &Config, interval: Duration) -> anyhow::Result<()> {
    let resolver = Arc::new(WeatherResolver::from_config(config)?);
    let handle = RefreshLoop::spawn(resolver, interval);
    let mut updates = handle.subscribe();

    tracing::info!(
        interval_mins = interval.as_secs() / 60,
        "Refreshing weather, press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot: Option<WeatherSnapshot> = updates.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    let stamp = Local::now().format("%H:%M");
                    println!("[{stamp}]\n{}\n", format_snapshot(&snapshot));
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.weather.api_key = Some(api_key.trim().to_string());
    }

    let source = Select::new("Position source:", PositionSource::all().to_vec())
        .prompt()
        .context("Failed to read position source")?;

    if source == PositionSource::Fixed {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number, e.g. 45.75")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number, e.g. 4.85")
            .prompt()
            .context("Failed to read longitude")?;

        // Validates the range before anything is written.
        garden_weather_core::FixedPosition::new(latitude, longitude)?;
        config.set_fixed_position(latitude, longitude);
    } else {
        config.position.source = source;
    }

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
