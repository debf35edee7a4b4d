use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{error::WeatherError, model::Coordinates};

use super::{WeatherProvider, truncate_body};

/// Visual Crossing timeline API.
#[derive(Debug, Clone)]
pub struct VisualCrossingProvider {
    base_url: String,
    api_key: String,
    unit_group: String,
    http: Client,
}

impl VisualCrossingProvider {
    pub fn new(
        base_url: String,
        api_key: String,
        unit_group: String,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            api_key,
            unit_group,
            http,
        })
    }

    fn timeline_url(&self, coords: Coordinates) -> String {
        format!(
            "{}/VisualCrossingWebServices/rest/services/timeline/{},{}",
            self.base_url.trim_end_matches('/'),
            coords.lat,
            coords.lon
        )
    }
}

#[async_trait]
impl WeatherProvider for VisualCrossingProvider {
    #[instrument(skip(self), fields(lat = %coords.lat, lon = %coords.lon))]
    async fn get_weather(&self, coords: Coordinates) -> Result<Value, WeatherError> {
        let url = self.timeline_url(coords);
        debug!(url = %url, "Fetching weather timeline");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("unitGroup", self.unit_group.as_str()),
                ("key", self.api_key.as_str()),
                ("contentType", "json"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let payload: Value = serde_json::from_str(&body)?;
        Ok(payload)
    }
}
