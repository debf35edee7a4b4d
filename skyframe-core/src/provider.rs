use crate::{Config, error::WeatherError, model::Coordinates};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod visualcrossing;

pub use visualcrossing::VisualCrossingProvider;

/// Source of raw weather payloads.
///
/// The payload is returned untouched; shaping it is the assembler's job.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, coords: Coordinates) -> Result<serde_json::Value, WeatherError>;
}

/// Construct the weather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.weather_api_key()?;

    let provider = VisualCrossingProvider::new(
        config.weather_base_url.clone(),
        api_key.to_owned(),
        config.unit_group.clone(),
        config.http_timeout(),
    )?;

    Ok(Box::new(provider))
}

/// Shorten an error body so it fits in a log line or error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No weather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let cfg = Config {
            weather_api_key: Some("KEY".into()),
            ..Config::default()
        };
        assert!(provider_from_config(&cfg).is_ok());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "ж".repeat(150);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);

        assert_eq!(truncate_body("short"), "short");
    }
}
