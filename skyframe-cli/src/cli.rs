use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Text};
use skyframe_core::{Config, Coordinates, FixedLocation, WeatherScreen};
use tracing::debug;

use crate::view;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyframe", version, about = "Weather with a generated backdrop")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure API credentials, locale and default location.
    Configure,

    /// Show current weather and the five-day forecast.
    Show {
        /// Latitude; falls back to the configured default location.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude; falls back to the configured default location.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Where to write the generated background image.
        #[arg(long, default_value = "weather.jpg")]
        out: PathBuf,

        /// Skip background image generation.
        #[arg(long)]
        no_image: bool,

        /// Do not offer to regenerate the image.
        #[arg(long)]
        no_prompt: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                lat,
                lon,
                out,
                no_image,
                no_prompt,
            } => show(lat, lon, out, no_image, no_prompt).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    cfg.weather_api_key = prompt_secret("Visual Crossing API key:", cfg.weather_api_key.take())?;
    cfg.render_api_key = prompt_secret("Fusion Brain API key:", cfg.render_api_key.take())?;
    cfg.render_secret_key =
        prompt_secret("Fusion Brain secret key:", cfg.render_secret_key.take())?;

    let locale = Text::new("Locale for weekday names:")
        .with_default(&cfg.locale)
        .prompt()?;
    cfg.locale = locale;

    let current = cfg
        .default_location
        .map(|c| format!("{}, {}", c.lat, c.lon))
        .unwrap_or_default();
    let location = Text::new("Default location as \"lat, lon\" (empty for none):")
        .with_initial_value(&current)
        .prompt()?;
    cfg.default_location = parse_location(&location)?;

    cfg.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Empty input keeps the existing secret.
fn prompt_secret(message: &str, existing: Option<String>) -> anyhow::Result<Option<String>> {
    let mut prompt = Password::new(message).without_confirmation();
    if existing.is_some() {
        prompt = prompt.with_help_message("Leave empty to keep the current value");
    }
    let value = prompt.prompt()?;

    Ok(if value.trim().is_empty() {
        existing
    } else {
        Some(value.trim().to_string())
    })
}

fn parse_location(input: &str) -> anyhow::Result<Option<Coordinates>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let Some((lat, lon)) = input.split_once(',') else {
        bail!("Expected \"lat, lon\", got '{input}'");
    };
    let lat: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("Invalid latitude '{lat}'"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .with_context(|| format!("Invalid longitude '{lon}'"))?;

    Ok(Some(Coordinates::new(lat, lon)?))
}

async fn show(
    lat: Option<f64>,
    lon: Option<f64>,
    out: PathBuf,
    no_image: bool,
    no_prompt: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if no_image {
        config.render_api_key = None;
    }

    let coords = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
        _ => config.default_location,
    };

    let screen = WeatherScreen::from_config(&config, Box::new(FixedLocation::new(coords)))?;

    let loaded = screen.load().await;
    view::render(&screen.snapshot());

    if let Err(e) = loaded {
        // Already shown in the error banner.
        debug!(error = ?e, "Screen load failed");
        return Ok(());
    }
    if !screen.has_generator() {
        return Ok(());
    }

    loop {
        if screen.snapshot().generating {
            println!("\nGenerating image...");
            screen.settle().await;
        }

        let state = screen.snapshot();
        view::render_image_status(&state);

        if let Some(image) = &state.image {
            std::fs::write(&out, image.bytes())
                .with_context(|| format!("Failed to write image to {}", out.display()))?;
            println!("Background saved to {}", out.display());
        }

        if no_prompt || !state.can_regenerate() {
            break;
        }
        if !Confirm::new("Regenerate the image?")
            .with_default(false)
            .prompt()?
        {
            break;
        }
        screen.regenerate()?;
    }

    Ok(())
}
