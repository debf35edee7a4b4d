//! Weather screen session: fetches weather for the current location and keeps
//! the background image in sync with it.
//!
//! Presentation state lives in a `watch` channel so a front-end can render
//! on every change. Only the most recently started generation job may write
//! to it; a superseded job is cancelled and its outcome dropped.

use std::sync::Arc;

use chrono::Locale;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::Config;
use crate::assembler::{assemble, parse_locale};
use crate::condition::describe;
use crate::error::{AssemblyError, GenerationError, ScreenError};
use crate::generation::ImageGenerator;
use crate::geocode::{NominatimGeocoder, ReverseGeocoder};
use crate::location::LocationProvider;
use crate::model::{CurrentConditions, DailyForecast, GeneratedImage};
use crate::provider::{WeatherProvider, provider_from_config};

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenState {
    pub current: Option<CurrentConditions>,
    /// Why `current` is absent after a successful fetch.
    pub current_unavailable: Option<AssemblyError>,
    /// Up to five upcoming days. `None` until a weather fetch succeeds.
    pub forecast: Option<Vec<DailyForecast>>,
    pub generating: bool,
    pub image: Option<GeneratedImage>,
    /// Single user-visible error message.
    pub error: Option<String>,
    /// Prompt derived from the last known weather.
    pub description: Option<String>,
}

impl ScreenState {
    pub fn can_regenerate(&self) -> bool {
        !self.generating && self.description.is_some()
    }
}

#[derive(Debug, Default)]
struct JobSlot {
    epoch: u64,
    active: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    state: watch::Sender<ScreenState>,
    jobs: Mutex<JobSlot>,
}

#[derive(Debug)]
pub struct WeatherScreen {
    location: Box<dyn LocationProvider>,
    geocoder: Box<dyn ReverseGeocoder>,
    weather: Box<dyn WeatherProvider>,
    generator: Option<ImageGenerator>,
    locale: Locale,
    shared: Arc<Shared>,
}

impl WeatherScreen {
    pub fn new(
        location: Box<dyn LocationProvider>,
        geocoder: Box<dyn ReverseGeocoder>,
        weather: Box<dyn WeatherProvider>,
        generator: Option<ImageGenerator>,
        locale: Locale,
    ) -> Self {
        let (state, _) = watch::channel(ScreenState::default());
        Self {
            location,
            geocoder,
            weather,
            generator,
            locale,
            shared: Arc::new(Shared {
                state,
                jobs: Mutex::new(JobSlot::default()),
            }),
        }
    }

    /// Wire up the HTTP collaborators described by `config`. Image
    /// generation is left out when its credentials are missing.
    pub fn from_config(
        config: &Config,
        location: Box<dyn LocationProvider>,
    ) -> anyhow::Result<Self> {
        let geocoder =
            NominatimGeocoder::new(config.geocoder_base_url.clone(), config.http_timeout())?;
        let weather = provider_from_config(config)?;

        let generator = if config.is_render_configured() {
            Some(ImageGenerator::from_config(config)?)
        } else {
            info!("Image generation credentials not configured; background generation disabled");
            None
        };

        Ok(Self::new(
            location,
            Box::new(geocoder),
            weather,
            generator,
            parse_locale(&config.locale),
        ))
    }

    pub fn snapshot(&self) -> ScreenState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenState> {
        self.shared.state.subscribe()
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Fetch location, place name and weather, publish them, and kick off
    /// image generation for the current condition.
    pub async fn load(&self) -> Result<(), ScreenError> {
        let coords = match self.location.coordinates().await {
            Ok(coords) => coords,
            Err(e) => return Err(self.fail(e.into())),
        };

        let (place, payload) = tokio::join!(
            self.geocoder.resolve_place(coords),
            self.weather.get_weather(coords)
        );

        let place = match place {
            Ok(place) => Some(place),
            Err(e) => {
                let err = ScreenError::from(e);
                warn!(error = %err, "Falling back to provider place name");
                None
            }
        };

        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                self.shared.state.send_modify(|s| s.forecast = None);
                return Err(self.fail(e.into()));
            }
        };

        let assembled = assemble(&payload, place.as_deref(), self.locale);
        let current_unavailable = assembled.current_conditions().err();
        let description = assembled
            .current
            .as_ref()
            .map(|c| describe(&c.condition_code).to_string());

        info!(
            place = assembled.current.as_ref().map(|c| c.place.as_str()).unwrap_or("-"),
            forecast_days = assembled.forecast.len(),
            "Weather loaded"
        );

        self.shared.state.send_modify(|s| {
            s.current = assembled.current;
            s.current_unavailable = current_unavailable;
            s.forecast = Some(assembled.forecast);
            s.description = description.clone();
        });

        match description {
            Some(description) if self.generator.is_some() => {
                self.start_generation(&description);
            }
            Some(_) => debug!("No image generator; skipping background"),
            None => debug!("No current conditions; skipping background"),
        }

        Ok(())
    }

    /// Re-run generation with the last known description.
    pub fn regenerate(&self) -> Result<(), ScreenError> {
        let state = self.snapshot();
        if state.generating {
            return Err(ScreenError::GenerationInProgress);
        }
        let description = state.description.ok_or(ScreenError::NoWeather)?;

        if !self.start_generation(&description) {
            let err = GenerationError::PipelineUnavailable(
                "image generation is not configured".to_string(),
            );
            return Err(self.fail(err.into()));
        }
        Ok(())
    }

    /// Start a job for `description`, superseding any job still running.
    /// Returns false when no generator is configured.
    pub fn start_generation(&self, description: &str) -> bool {
        let Some(generator) = &self.generator else {
            return false;
        };

        let mut jobs = self.shared.jobs.lock();
        if let Some(previous) = jobs.active.take() {
            // Dropping the aborted task drops its handle, which cancels the job.
            previous.abort();
            debug!(epoch = jobs.epoch, "Superseded running generation job");
        }
        jobs.epoch += 1;
        let epoch = jobs.epoch;

        self.shared.state.send_modify(|s| {
            s.generating = true;
            s.error = None;
            s.description = Some(description.to_string());
        });

        let handle = generator.start(description);
        let shared = Arc::clone(&self.shared);

        jobs.active = Some(tokio::spawn(async move {
            let outcome = handle.outcome().await;

            let jobs = shared.jobs.lock();
            if jobs.epoch != epoch {
                debug!(epoch, "Discarding outcome of superseded job");
                return;
            }

            shared.state.send_modify(|s| {
                s.generating = false;
                match outcome {
                    Ok(image) => s.image = Some(image),
                    Err(GenerationError::Cancelled) => {}
                    Err(e) => s.error = Some(e.to_string()),
                }
            });
        }));

        true
    }

    /// Wait until no generation job is running.
    pub async fn settle(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|s| !s.generating).await;
    }

    fn fail(&self, err: ScreenError) -> ScreenError {
        warn!(error = %err, "Screen step failed");
        let message = err.to_string();
        self.shared.state.send_modify(|s| s.error = Some(message));
        err
    }
}

impl Drop for WeatherScreen {
    fn drop(&mut self) {
        if let Some(active) = self.shared.jobs.lock().active.take() {
            active.abort();
        }
    }
}
