//! Reverse geocoding through Nominatim (OpenStreetMap).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::GeocodeError;
use crate::model::Coordinates;
use crate::provider::truncate_body;

const USER_AGENT: &str = concat!("skyframe/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn resolve_place(&self, coords: Coordinates) -> Result<String, GeocodeError>;
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    #[instrument(skip(self), fields(lat = %coords.lat, lon = %coords.lon))]
    async fn resolve_place(&self, coords: Coordinates) -> Result<String, GeocodeError> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body: NominatimResponse = res.json().await?;
        let addr = body.address.ok_or(GeocodeError::NoAddress)?;

        let place = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .ok_or(GeocodeError::NoAddress)?;

        debug!(place = %place, "Reverse geocoded");
        Ok(place)
    }
}
