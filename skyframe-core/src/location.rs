use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::LocationError;
use crate::model::Coordinates;

/// Source of the device coordinates.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn coordinates(&self) -> Result<Coordinates, LocationError>;
}

/// Coordinates supplied up front (command-line flags or the config file).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coords: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(coords: Option<Coordinates>) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn coordinates(&self) -> Result<Coordinates, LocationError> {
        self.coords.ok_or_else(|| {
            LocationError::Unavailable(
                "no coordinates given; pass --lat/--lon or set default_location".to_string(),
            )
        })
    }
}
