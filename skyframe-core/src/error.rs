//! Error taxonomy for the weather screen.
//!
//! Each collaborator has its own error type; [`ScreenError`] is what the
//! presentation layer sees. Only required steps surface to the user:
//! geocoding failures are logged and replaced by a fallback place name.

use std::time::Duration;

use thiserror::Error;

/// Failure to obtain device coordinates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission was not granted")]
    PermissionDenied,
    #[error("Location is unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the reverse-geocoding collaborator. Never shown to the user.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Geocoding service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Geocoding response has no address")]
    NoAddress,
}

/// Failure of the weather provider.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Weather service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Weather response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Transport-level failure talking to the rendering pipeline.
///
/// The workflow decides which [`GenerationError`] a `RenderError` maps to,
/// depending on the phase it happened in.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Rendering pipeline request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Rendering pipeline returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Rendering pipeline response could not be parsed: {0}")]
    Parse(String),
}

/// Why an image generation job did not produce an image.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Could not connect to the image generation service: {0}")]
    PipelineUnavailable(String),
    #[error("Image generation request was rejected: {0}")]
    SubmissionRejected(String),
    #[error("Lost connection while checking generation status: {0}")]
    PollTransport(String),
    #[error("Image generation failed")]
    GenerationFailed,
    #[error("Image was not found in the generation result")]
    EmptyResult,
    #[error("Image generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Image generation was cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn reason(&self) -> FailureReason {
        match self {
            GenerationError::PipelineUnavailable(_) => FailureReason::PipelineUnavailable,
            GenerationError::SubmissionRejected(_) => FailureReason::SubmissionRejected,
            GenerationError::PollTransport(_) => FailureReason::TransportError,
            GenerationError::GenerationFailed => FailureReason::GenerationFailed,
            GenerationError::EmptyResult => FailureReason::EmptyResult,
            GenerationError::Timeout(_) => FailureReason::Timeout,
            GenerationError::Cancelled => FailureReason::Cancelled,
        }
    }
}

/// Compact, copyable failure tag carried by the workflow state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    PipelineUnavailable,
    SubmissionRejected,
    EmptyResult,
    GenerationFailed,
    TransportError,
    Timeout,
    Cancelled,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::PipelineUnavailable => "pipeline-unavailable",
            FailureReason::SubmissionRejected => "submission-rejected",
            FailureReason::EmptyResult => "empty-result",
            FailureReason::GenerationFailed => "generation-failed",
            FailureReason::TransportError => "transport-error",
            FailureReason::Timeout => "timeout",
            FailureReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The forecast payload had no usable current conditions.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("No current weather data")]
    MissingCurrentConditions,
}

/// Errors surfaced by the screen session.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("Location permission was not granted")]
    PermissionDenied,
    #[error("Location is unavailable: {0}")]
    LocationUnavailable(String),
    #[error("Could not resolve place name: {0}")]
    GeocodingFailed(#[from] GeocodeError),
    #[error("Could not fetch weather data: {0}")]
    WeatherFetchFailed(#[from] WeatherError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("Image generation is already in progress")]
    GenerationInProgress,
    #[error("No weather data to describe")]
    NoWeather,
}

impl From<LocationError> for ScreenError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::PermissionDenied => ScreenError::PermissionDenied,
            LocationError::Unavailable(msg) => ScreenError::LocationUnavailable(msg),
        }
    }
}
