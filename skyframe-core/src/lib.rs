//! Core library for the `skyframe` weather screen.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Collaborators: location, reverse geocoding, weather and rendering pipeline
//! - The forecast assembler that normalizes raw weather payloads
//! - The image generation workflow (discover → submit → poll with a ceiling)
//! - The screen session that owns presentation state
//!
//! It is used by `skyframe-cli`, but any front-end can drive a [`WeatherScreen`].

pub mod assembler;
pub mod condition;
pub mod config;
pub mod error;
pub mod generation;
pub mod geocode;
pub mod location;
pub mod model;
pub mod provider;
pub mod render;
pub mod screen;

pub use assembler::{Assembled, assemble};
pub use config::Config;
pub use error::{
    AssemblyError, FailureReason, GenerationError, GeocodeError, LocationError, RenderError,
    ScreenError, WeatherError,
};
pub use generation::{GenerationHandle, GenerationState, ImageGenerator, PollSettings};
pub use geocode::{NominatimGeocoder, ReverseGeocoder};
pub use location::{FixedLocation, LocationProvider};
pub use model::{Coordinates, CurrentConditions, DailyForecast, GeneratedImage};
pub use provider::{VisualCrossingProvider, WeatherProvider};
pub use render::{FusionBrainClient, RenderPipeline};
pub use screen::{ScreenState, WeatherScreen};
