//! Weather data for the tire-change advisor.
//!
//! Resolves the device location with a fallback, fetches daily min/max
//! forecasts from Open-Meteo or OpenWeatherMap, and provides monthly
//! climate averages for when the forecast alone is not conclusive.

pub mod types;
pub mod climate;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod synthetic;

pub use types::*;
pub use climate::{AnyClimateSource, ArchiveClimateClient, ClimateSource, StaticClimate};
pub use geocode::Geocoder;
pub use location::{
    AnyPositionSource, FixedPosition, IpPositionSource, LocationOrigin, LocationResolver,
    NoPosition, PositionSource, ResolvedLocation,
};
pub use provider::{ForecastBackend, ForecastClient, ForecastProvider};
pub use synthetic::synthetic_forecast;
