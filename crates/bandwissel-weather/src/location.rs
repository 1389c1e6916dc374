//! Position lookup with a fallback location.
//!
//! A [`PositionSource`] yields the device position once per request. The
//! [`LocationResolver`] bounds that lookup with a timeout, names the place
//! through the [`Geocoder`], and substitutes the configured fallback when
//! no position is available.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::geocode::Geocoder;
use crate::types::{Location, LocationError};

pub const IP_API_URL: &str = "http://ip-api.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Something that can report where the device is.
pub trait PositionSource: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<Location, LocationError>> + Send;
}

/// Looks up an approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpPositionSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

impl IpPositionSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl PositionSource for IpPositionSource {
    async fn current_position(&self) -> Result<Location, LocationError> {
        let url = format!("{}/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("fields", "status,message,lat,lon,city")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout
                } else {
                    tracing::debug!("IP lookup failed: {}", e);
                    LocationError::ServiceUnavailable
                }
            })?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LocationError::PermissionDenied)
            }
            s => {
                tracing::debug!("IP lookup returned status {}", s);
                return Err(LocationError::ServiceUnavailable);
            }
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("Invalid IP lookup response: {}", e)))?;

        if body.status != "success" {
            let message = body.message.unwrap_or_else(|| "lookup failed".to_string());
            tracing::debug!("IP lookup unsuccessful: {}", message);
            return Err(LocationError::Other(message));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                let mut location = Location::new(lat, lon);
                location.city_name = body.city.filter(|c| !c.trim().is_empty());
                Ok(location)
            }
            _ => Err(LocationError::Other("IP lookup returned no coordinates".to_string())),
        }
    }
}

/// Always reports the same position.
#[derive(Debug, Clone)]
pub struct FixedPosition(pub Location);

impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Location, LocationError> {
        Ok(self.0.clone())
    }
}

/// No position available on this device.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPosition;

impl PositionSource for NoPosition {
    async fn current_position(&self) -> Result<Location, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

/// Position source chosen at runtime from configuration
#[derive(Debug, Clone)]
pub enum AnyPositionSource {
    Ip(IpPositionSource),
    Fixed(FixedPosition),
    None(NoPosition),
}

impl PositionSource for AnyPositionSource {
    async fn current_position(&self) -> Result<Location, LocationError> {
        match self {
            Self::Ip(source) => source.current_position().await,
            Self::Fixed(source) => source.current_position().await,
            Self::None(source) => source.current_position().await,
        }
    }
}

/// Where a resolved location came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationOrigin {
    Device,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub location: Location,
    pub origin: LocationOrigin,
}

pub struct LocationResolver<S> {
    source: S,
    geocoder: Geocoder,
    fallback: Location,
    timeout: Duration,
}

impl<S: PositionSource> LocationResolver<S> {
    /// `fallback` should carry a city name; it is used as-is.
    pub fn new(source: S, geocoder: Geocoder, fallback: Location, timeout: Duration) -> Self {
        Self {
            source,
            geocoder,
            fallback,
            timeout,
        }
    }

    /// Resolve the device location, falling back to the configured location
    /// on any failure. Never fails.
    pub async fn resolve(&self) -> ResolvedLocation {
        match self.resolve_strict().await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(
                    "Location unavailable ({}), using fallback {}",
                    e,
                    self.fallback.display_name()
                );
                self.fallback()
            }
        }
    }

    /// Resolve the device location, reporting why it is unavailable instead
    /// of falling back.
    pub async fn resolve_strict(&self) -> Result<ResolvedLocation, LocationError> {
        let mut location = tokio::time::timeout(self.timeout, self.source.current_position())
            .await
            .map_err(|_| LocationError::Timeout)??;

        tracing::info!("Got location: {}, {}", location.latitude, location.longitude);

        if let Some(name) = self.geocoder.reverse_geocode(&location).await {
            location.city_name = Some(name);
        }

        Ok(ResolvedLocation {
            location,
            origin: LocationOrigin::Device,
        })
    }

    pub fn fallback(&self) -> ResolvedLocation {
        ResolvedLocation {
            location: self.fallback.clone(),
            origin: LocationOrigin::Fallback,
        }
    }
}
