use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::LocationError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside the valid lat/lon ranges.
    pub fn new(lat: f64, lon: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(LocationError::Unavailable(format!(
                "coordinates out of range: {lat}, {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// Snapshot of the weather right now, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub place: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub condition_code: String,
    pub wind_speed: f64,
    pub humidity_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Localized weekday name with its first letter capitalized.
    pub label: String,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
    pub condition_code: String,
}

/// Image returned by the rendering pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    base64: String,
    bytes: Vec<u8>,
}

impl GeneratedImage {
    /// Decode the base64 payload the pipeline puts in its result files.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        let trimmed = encoded.trim();
        let bytes = STANDARD.decode(trimmed)?;
        Ok(Self {
            base64: trimmed.to_string(),
            bytes,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// URI form suitable for an image view.
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_reject_out_of_range() {
        assert!(Coordinates::new(55.75, 37.62).is_ok());
        assert!(Coordinates::new(90.0, -180.0).is_ok());
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, 180.5).is_err());
    }

    #[test]
    fn generated_image_decodes_and_builds_data_uri() {
        let image = GeneratedImage::from_base64(" aGVsbG8= \n").expect("valid base64");
        assert_eq!(image.bytes(), b"hello");
        assert_eq!(image.data_uri(), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn generated_image_rejects_garbage() {
        assert!(GeneratedImage::from_base64("not base64!").is_err());
    }
}
