//! The advice chain: location, forecast, optional climate lookup, analysis.
//!
//! Each [`AdviceService::request_advice`] call supersedes the one before
//! it. The older chain is cancelled at its next await point and reports
//! [`AdviceError::Cancelled`] instead of a result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bandwissel_core::{
    ClimateSourceKind, Config, FetchFailurePolicy, ForecastBackend as BackendKind,
    PositionSourceKind,
};
use bandwissel_weather::{
    synthetic_forecast, AnyClimateSource, AnyPositionSource, ArchiveClimateClient, ClimateSource,
    ClimateTable, FixedPosition, ForecastBackend, ForecastClient, ForecastProvider, Geocoder,
    IpPositionSource, Location, LocationResolver, NoPosition, PositionSource, ResolvedLocation,
    StaticClimate, MAX_FORECAST_DAYS,
};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::analyzer::{Advice, Analyzer};
use crate::error::AdviceError;

/// Whether the analyzed forecast came from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastOrigin {
    Live,
    /// Built from monthly averages after the provider failed
    Synthetic,
}

/// Everything needed to present one round of advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceReport {
    pub location: ResolvedLocation,
    pub forecast_origin: ForecastOrigin,
    pub advice: Advice,
    pub today: NaiveDate,
}

/// Service built from the configuration file
pub type ConfiguredService = AdviceService<AnyPositionSource, ForecastClient, AnyClimateSource>;

pub struct AdviceService<P, F, C> {
    resolver: LocationResolver<P>,
    forecast: F,
    climate: C,
    fallback_table: ClimateTable,
    analyzer: Analyzer,
    on_failure: FetchFailurePolicy,
    strict_location: bool,
    current: Mutex<Option<(u64, CancellationToken)>>,
    generation: AtomicU64,
}

impl<P, F, C> AdviceService<P, F, C>
where
    P: PositionSource,
    F: ForecastProvider,
    C: ClimateSource,
{
    pub fn new(
        resolver: LocationResolver<P>,
        forecast: F,
        climate: C,
        fallback_table: ClimateTable,
        analyzer: Analyzer,
    ) -> Self {
        Self {
            resolver,
            forecast,
            climate,
            fallback_table,
            analyzer,
            on_failure: FetchFailurePolicy::default(),
            strict_location: false,
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// Report location failures instead of using the fallback location
    pub fn with_strict_location(mut self, strict: bool) -> Self {
        self.strict_location = strict;
        self
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Run one advice chain, cancelling any chain still in flight.
    #[instrument(skip(self))]
    pub async fn request_advice(&self, today: NaiveDate) -> Result<AdviceReport, AdviceError> {
        let (generation, token) = self.begin();

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(AdviceError::Cancelled),
            result = self.run_chain(today) => result,
        };

        self.finish(generation);

        // A newer request may have arrived after the chain finished
        if token.is_cancelled() {
            tracing::debug!("Discarding result of superseded request {}", generation);
            return Err(AdviceError::Cancelled);
        }
        result
    }

    /// Cancel the chain in flight, if any
    pub fn cancel(&self) {
        if let Some((generation, token)) = self.current.lock().take() {
            tracing::debug!("Cancelling request {}", generation);
            token.cancel();
        }
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let previous = self.current.lock().replace((generation, token.clone()));
        if let Some((old, old_token)) = previous {
            tracing::info!("Request {} supersedes request {}", generation, old);
            old_token.cancel();
        }

        (generation, token)
    }

    fn finish(&self, generation: u64) {
        let mut current = self.current.lock();
        if matches!(*current, Some((g, _)) if g == generation) {
            *current = None;
        }
    }

    async fn run_chain(&self, today: NaiveDate) -> Result<AdviceReport, AdviceError> {
        let location = if self.strict_location {
            self.resolver.resolve_strict().await?
        } else {
            self.resolver.resolve().await
        };

        tracing::info!(
            "Fetching forecast for {}",
            location.location.display_name()
        );

        let (forecast, forecast_origin) = match self.forecast.fetch_daily(&location.location).await {
            Ok(forecast) => (forecast, ForecastOrigin::Live),
            Err(e) => match self.on_failure {
                FetchFailurePolicy::Halt => {
                    tracing::error!("Forecast unavailable: {}", e);
                    return Err(e.into());
                }
                FetchFailurePolicy::Synthesize => {
                    tracing::warn!("Forecast unavailable ({}), using monthly averages", e);
                    let synthetic =
                        synthetic_forecast(&self.fallback_table, today, MAX_FORECAST_DAYS);
                    (synthetic, ForecastOrigin::Synthetic)
                }
            },
        };

        tracing::info!("Analyzing {} forecast days", forecast.len());

        let climate = if self.analyzer.needs_climate(&forecast) {
            match self.climate.monthly_averages(&location.location, today).await {
                Ok(table) => Some(table),
                Err(e) => {
                    tracing::warn!("Climate averages unavailable ({}), using built-in table", e);
                    Some(self.fallback_table.clone())
                }
            }
        } else {
            None
        };

        let advice = self.analyzer.advise(&forecast, climate.as_ref(), today);

        Ok(AdviceReport {
            location,
            forecast_origin,
            advice,
            today,
        })
    }
}

/// Build the service described by `config`.
///
/// # Errors
///
/// Fails when the configured sources cannot be constructed or the fallback
/// climate table does not cover all twelve months.
pub fn build_service(config: &Config) -> Result<ConfiguredService, AdviceError> {
    let fallback_table = ClimateTable::from_entries(
        config
            .climate
            .fallback_climate_table
            .iter()
            .map(|m| (m.month, m.avg_min, m.avg_max)),
    )
    .ok_or_else(|| {
        AdviceError::Config("fallback_climate_table must cover months 1-12".to_string())
    })?;

    let source = match config.location.source {
        PositionSourceKind::Ip => {
            AnyPositionSource::Ip(IpPositionSource::new(config.location.ip_lookup_url.clone())?)
        }
        PositionSourceKind::Fixed => {
            let fixed = config.location.fixed.as_ref().ok_or_else(|| {
                AdviceError::Config("location.fixed is required for the fixed source".to_string())
            })?;
            AnyPositionSource::Fixed(FixedPosition(Location::new(fixed.latitude, fixed.longitude)))
        }
        PositionSourceKind::None => AnyPositionSource::None(NoPosition),
    };

    let api_key = config
        .forecast
        .has_api_key()
        .then(|| config.forecast.api_key.clone());
    let geocoder = Geocoder::new(config.location.geocode_url.clone(), api_key)?;

    let fallback = &config.location.fallback;
    let fallback_location =
        Location::new(fallback.latitude, fallback.longitude).with_city_name(fallback.name.clone());

    let resolver = LocationResolver::new(
        source,
        geocoder,
        fallback_location,
        Duration::from_secs(config.location.timeout_secs),
    );

    let backend = match config.forecast.backend {
        BackendKind::OpenMeteo => ForecastBackend::OpenMeteo,
        BackendKind::OpenWeatherMap => ForecastBackend::OpenWeatherMap {
            api_key: config.forecast.api_key.clone(),
        },
    };
    let forecast = match &config.forecast.base_url {
        Some(url) => ForecastClient::with_base_url(backend, url.clone())?,
        None => ForecastClient::new(backend)?,
    };

    let climate = match config.climate.source {
        ClimateSourceKind::Archive => AnyClimateSource::Archive(ArchiveClimateClient::new(
            config.climate.archive_url.clone(),
            config.climate.years,
            fallback_table.clone(),
        )?),
        ClimateSourceKind::Table => AnyClimateSource::Static(StaticClimate(fallback_table.clone())),
    };

    tracing::debug!(
        "Advice service: {:?} position, {:?} forecast, {:?} climate",
        config.location.source,
        config.forecast.backend,
        config.climate.source
    );

    Ok(AdviceService::new(
        resolver,
        forecast,
        climate,
        fallback_table,
        Analyzer::from_config(&config.analysis),
    )
    .with_failure_policy(config.forecast.on_failure)
    .with_strict_location(config.location.strict))
}
