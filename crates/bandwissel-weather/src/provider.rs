//! Daily forecast providers.
//!
//! Each backend's response is normalized into a [`Forecast`] here; entries
//! with missing fields never leave this module.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{DailyObservation, Forecast, Location, WeatherError, MAX_FORECAST_DAYS};

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com";
pub const OPENWEATHERMAP_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Something that returns a daily min/max forecast for a location.
pub trait ForecastProvider: Send + Sync {
    fn fetch_daily(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<Forecast, WeatherError>> + Send;
}

/// Supported forecast APIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastBackend {
    /// Open-Meteo daily forecast, by coordinates, 16 days
    OpenMeteo,
    /// OpenWeatherMap 5 day / 3 hour forecast, by city name when known
    OpenWeatherMap { api_key: String },
}

impl ForecastBackend {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenMeteo => OPEN_METEO_URL,
            Self::OpenWeatherMap { .. } => OPENWEATHERMAP_URL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Arc<Client>,
    backend: ForecastBackend,
    base_url: String,
}

impl ForecastClient {
    pub fn new(backend: ForecastBackend) -> Result<Self, WeatherError> {
        let base_url = backend.default_base_url();
        Self::with_base_url(backend, base_url)
    }

    pub fn with_base_url(
        backend: ForecastBackend,
        base_url: impl Into<String>,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            backend,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_open_meteo(&self, location: &Location) -> Result<Forecast, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("daily", "temperature_2m_min,temperature_2m_max".to_string()),
                ("forecast_days", MAX_FORECAST_DAYS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let body: OpenMeteoResponse = read_json(response).await?;
        let daily = body
            .daily
            .ok_or_else(|| WeatherError::Malformed("missing daily block".to_string()))?;

        Ok(Forecast::from_observations(open_meteo_observations(daily)))
    }

    #[instrument(skip(self, api_key), level = "info")]
    async fn fetch_openweathermap(
        &self,
        location: &Location,
        api_key: &str,
    ) -> Result<Forecast, WeatherError> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let mut params = match &location.city_name {
            Some(name) => vec![("q", name.clone())],
            None => vec![
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
            ],
        };
        params.push(("units", "metric".to_string()));
        params.push(("appid", api_key.to_string()));

        let response = self.client.get(&url).query(&params).send().await?;

        let body: OwmForecastResponse = read_json(response).await?;
        let list = body
            .list
            .ok_or_else(|| WeatherError::Malformed("missing forecast list".to_string()))?;

        Ok(aggregate_three_hourly(list))
    }
}

impl ForecastProvider for ForecastClient {
    async fn fetch_daily(&self, location: &Location) -> Result<Forecast, WeatherError> {
        let forecast = match &self.backend {
            ForecastBackend::OpenMeteo => self.fetch_open_meteo(location).await?,
            ForecastBackend::OpenWeatherMap { api_key } => {
                self.fetch_openweathermap(location, api_key).await?
            }
        };

        tracing::info!(
            "Fetched {} forecast days for {}",
            forecast.len(),
            location.display_name()
        );
        Ok(forecast)
    }
}

/// Map non-2xx statuses to [`WeatherError::Rejected`] and parse the body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, WeatherError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        tracing::debug!("Provider returned status {}: {}", status, message);
        return Err(WeatherError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| WeatherError::Malformed(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenMeteoResponse {
    pub(crate) daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenMeteoDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
}

/// Zip the parallel daily arrays, dropping entries with a null temperature
/// or an unparsable date.
pub(crate) fn open_meteo_observations(daily: OpenMeteoDaily) -> Vec<DailyObservation> {
    daily
        .time
        .iter()
        .zip(daily.temperature_2m_min)
        .zip(daily.temperature_2m_max)
        .filter_map(|((time, min), max)| {
            let date = NaiveDate::parse_from_str(time, "%Y-%m-%d").ok()?;
            Some(DailyObservation::new(date, min?, max?))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Option<Vec<OwmEntry>>,
}

#[derive(Debug, Deserialize)]
struct OwmEntry {
    dt_txt: Option<String>,
    main: Option<OwmMain>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
}

/// Fold 3-hourly entries into one min/max observation per calendar date.
fn aggregate_three_hourly(entries: Vec<OwmEntry>) -> Forecast {
    let mut per_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for entry in entries {
        let Some(date) = entry
            .dt_txt
            .as_deref()
            .and_then(|t| t.get(..10))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };
        let Some(main) = entry.main else {
            continue;
        };
        let (Some(low), Some(high)) = (main.temp_min.or(main.temp), main.temp_max.or(main.temp))
        else {
            continue;
        };
        if !low.is_finite() || !high.is_finite() {
            continue;
        }

        per_day
            .entry(date)
            .and_modify(|(min, max)| {
                *min = min.min(low);
                *max = max.max(high);
            })
            .or_insert((low, high));
    }

    Forecast::from_observations(
        per_day
            .into_iter()
            .map(|(date, (min, max))| DailyObservation::new(date, min, max)),
    )
}
