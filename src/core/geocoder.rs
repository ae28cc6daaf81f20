//! Nominatim-compatible forward geocoding.

use crate::domain::model::{GeoPoint, GeocodeOutcome};
use crate::domain::ports::Geocoder;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
}

impl NominatimGeocoder {
    /// `endpoint` is the service root; requests go to `{endpoint}/search`.
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn lookup(&self, address: &str) -> Result<Option<GeoPoint>> {
        let url = format!("{}/search", self.endpoint);
        tracing::debug!("Geocoding '{}' via {}", address, url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;

        let places: Vec<Place> = response.json().await?;
        let point = places.first().and_then(|place| {
            let lat = place.lat.trim().parse::<f64>().ok()?;
            let lon = place.lon.trim().parse::<f64>().ok()?;
            Some(GeoPoint::new(lat, lon))
        });
        Ok(point)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> GeocodeOutcome {
        match self.lookup(address).await {
            Ok(Some(point)) => {
                tracing::debug!("Resolved '{}' to {}, {}", address, point.lat, point.lon);
                GeocodeOutcome::Found(point)
            }
            Ok(None) => {
                tracing::warn!("No geocoding match for '{}'", address);
                GeocodeOutcome::NotFound
            }
            Err(e) => {
                tracing::warn!("Geocoding '{}' failed: {}", address, e);
                GeocodeOutcome::NotFound
            }
        }
    }
}
