//! Reverse geocoding: convert coordinates to a place name the forecast
//! provider accepts. Uses the OpenWeatherMap geocoding API.

use crate::types::{Location, LocationError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const OPENWEATHERMAP_GEO_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct GeoEntry {
    name: Option<String>,
    #[allow(dead_code)]
    country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl Geocoder {
    /// `api_key` of `None` disables lookups; every call then returns `None`.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Other(format!("Failed to build geocoding client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Reverse geocode coordinates to a place name (e.g. "Utrecht").
    /// Returns `None` on failure or timeout; the caller keeps the coordinates.
    pub async fn reverse_geocode(&self, location: &Location) -> Option<String> {
        if location.city_name.is_some() {
            return location.city_name.clone();
        }

        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("No API key configured, skipping reverse geocode");
            return None;
        };

        let url = format!("{}/geo/1.0/reverse", self.base_url);
        let request = self.client.get(&url).query(&[
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("limit", "1".to_string()),
            ("appid", api_key.to_string()),
        ]);

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let entries: Vec<GeoEntry> = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let name = entries
            .into_iter()
            .next()?
            .name
            .filter(|n| !n.trim().is_empty())?;

        tracing::info!("Reverse geocoded to: {}", name);
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_base_url() {
        let geocoder = Geocoder::new("http://localhost:8080/", None).unwrap();
        assert_eq!(geocoder.base_url, "http://localhost:8080");
        assert!(geocoder.api_key.is_none());
    }

    #[tokio::test]
    async fn test_reverse_geocode_preserves_existing_city() {
        let geocoder = Geocoder::new(OPENWEATHERMAP_GEO_URL, Some("key".to_string())).unwrap();
        let loc = Location::new(52.0907, 5.1214).with_city_name("Utrecht");
        let name = geocoder.reverse_geocode(&loc).await;
        assert_eq!(name.as_deref(), Some("Utrecht"));
    }

    #[tokio::test]
    async fn test_reverse_geocode_without_key_is_skipped() {
        let geocoder = Geocoder::new(OPENWEATHERMAP_GEO_URL, None).unwrap();
        let loc = Location::new(52.0907, 5.1214);
        assert_eq!(geocoder.reverse_geocode(&loc).await, None);
    }
}
