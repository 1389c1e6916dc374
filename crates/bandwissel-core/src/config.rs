use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `forecast.api_key`
pub const API_KEY_ENV: &str = "BANDWISSEL_API_KEY";

/// Longest run the forecast horizon can hold
pub const MAX_RUN_LENGTH: u32 = 16;

/// The historical archive reaches back to 1940
pub const MAX_CLIMATE_YEARS: u32 = 80;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Threshold rule settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Forecast provider settings
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Location lookup settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Historical climate settings
    #[serde(default)]
    pub climate: ClimateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Temperature (°C) the daily min/max must cross
    #[serde(default = "default_threshold")]
    pub threshold_celsius: f64,

    /// Number of consecutive qualifying days that confirm a switch
    #[serde(default = "default_run_length")]
    pub consecutive_days_required: u32,
}

fn default_threshold() -> f64 {
    7.0
}

fn default_run_length() -> u32 {
    7
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_celsius: default_threshold(),
            consecutive_days_required: default_run_length(),
        }
    }
}

/// Which forecast API to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForecastBackend {
    #[default]
    OpenMeteo,
    OpenWeatherMap,
}

/// What to do when the forecast request fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Show the error and stop
    Halt,
    /// Continue with a forecast derived from the climate table
    #[default]
    Synthesize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default)]
    pub backend: ForecastBackend,

    /// Override for the provider base URL (uses the provider default when unset)
    #[serde(default)]
    pub base_url: Option<String>,

    /// OpenWeatherMap API key (also used for reverse geocoding)
    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default)]
    pub on_failure: FetchFailurePolicy,
}

fn default_api_key() -> String {
    "YOUR_OPENWEATHERMAP_API_KEY".to_string()
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            backend: ForecastBackend::default(),
            base_url: None,
            api_key: default_api_key(),
            on_failure: FetchFailurePolicy::default(),
        }
    }
}

impl ForecastConfig {
    /// Check if the API key is configured (not a placeholder)
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty() && !self.api_key.starts_with("YOUR_")
    }
}

/// Where the device position comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PositionSourceKind {
    /// Look up the position from the public IP address
    #[default]
    Ip,
    /// Use `location.fixed`
    Fixed,
    /// No position source; always use the fallback location
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for FallbackLocation {
    fn default() -> Self {
        Self {
            name: "Amsterdam".to_string(),
            latitude: 52.3676,
            longitude: 4.9041,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub source: PositionSourceKind,

    /// Fail instead of using the fallback location when no position is available
    #[serde(default)]
    pub strict: bool,

    /// Time allowed for the position lookup
    #[serde(default = "default_location_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,

    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Coordinates used when `source = "fixed"`
    #[serde(default)]
    pub fixed: Option<FixedCoordinates>,

    #[serde(default)]
    pub fallback: FallbackLocation,
}

fn default_location_timeout() -> u64 {
    10
}

fn default_geocode_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: PositionSourceKind::default(),
            strict: false,
            timeout_secs: default_location_timeout(),
            geocode_url: default_geocode_url(),
            ip_lookup_url: default_ip_lookup_url(),
            fixed: None,
            fallback: FallbackLocation::default(),
        }
    }
}

/// Where monthly averages come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClimateSourceKind {
    /// Average recent years from the historical weather archive
    #[default]
    Archive,
    /// Only use `climate.fallback_climate_table`
    Table,
}

/// Average daily minimum and maximum for one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyNormal {
    pub month: u32,
    pub avg_min: f64,
    pub avg_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateConfig {
    #[serde(default)]
    pub source: ClimateSourceKind,

    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// Number of complete calendar years to average
    #[serde(default = "default_climate_years")]
    pub years: u32,

    /// Used when the archive is unavailable and for synthetic forecasts
    #[serde(default = "default_climate_table")]
    pub fallback_climate_table: Vec<MonthlyNormal>,
}

fn default_archive_url() -> String {
    "https://archive-api.open-meteo.com".to_string()
}

fn default_climate_years() -> u32 {
    3
}

/// De Bilt (NL) daily min/max normals, 1991-2020
fn default_climate_table() -> Vec<MonthlyNormal> {
    [
        (1, 0.9, 6.3),
        (2, 0.7, 7.1),
        (3, 2.5, 10.6),
        (4, 4.3, 14.6),
        (5, 7.9, 18.3),
        (6, 10.8, 21.0),
        (7, 12.9, 23.3),
        (8, 12.5, 23.0),
        (9, 10.1, 19.6),
        (10, 7.1, 15.0),
        (11, 3.9, 10.0),
        (12, 1.6, 6.9),
    ]
    .into_iter()
    .map(|(month, avg_min, avg_max)| MonthlyNormal {
        month,
        avg_min,
        avg_max,
    })
    .collect()
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            source: ClimateSourceKind::default(),
            archive_url: default_archive_url(),
            years: default_climate_years(),
            fallback_climate_table: default_climate_table(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str::<Config>(&contents)?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    /// [`Config::load_validated`] for the file at `path`
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                tracing::debug!("Using API key from {}", API_KEY_ENV);
                self.forecast.api_key = key;
            }
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !self.analysis.threshold_celsius.is_finite() {
            result.add_error(
                "analysis.threshold_celsius",
                "Threshold must be a finite number",
            );
        } else if !(-30.0..=30.0).contains(&self.analysis.threshold_celsius) {
            result.add_warning(
                "analysis.threshold_celsius",
                "Threshold is outside the usual range (-30..30 °C)",
            );
        }

        let run = self.analysis.consecutive_days_required;
        if run == 0 {
            result.add_error(
                "analysis.consecutive_days_required",
                "Run length must be at least 1 day",
            );
        } else if run > MAX_RUN_LENGTH {
            result.add_error(
                "analysis.consecutive_days_required",
                format!(
                    "Run length cannot exceed the {} day forecast horizon",
                    MAX_RUN_LENGTH
                ),
            );
        }

        if let Some(base_url) = &self.forecast.base_url {
            self.validate_url(base_url, "forecast.base_url", &mut result);
        }

        if !self.forecast.has_api_key() {
            if self.forecast.backend == ForecastBackend::OpenWeatherMap {
                result.add_error(
                    "forecast.api_key",
                    "OpenWeatherMap backend requires an API key",
                );
            } else {
                result.add_warning(
                    "forecast.api_key",
                    "API key not configured - reverse geocoding will be skipped",
                );
            }
        }

        if self.location.source == PositionSourceKind::Fixed && self.location.fixed.is_none() {
            result.add_error(
                "location.fixed",
                "Fixed position source requires location.fixed coordinates",
            );
        }

        if let Some(fixed) = &self.location.fixed {
            self.validate_coordinates(fixed.latitude, fixed.longitude, "location.fixed", &mut result);
        }

        self.validate_coordinates(
            self.location.fallback.latitude,
            self.location.fallback.longitude,
            "location.fallback",
            &mut result,
        );

        if self.location.fallback.name.trim().is_empty() {
            result.add_error("location.fallback.name", "Fallback name cannot be empty");
        }

        if self.location.timeout_secs == 0 {
            result.add_error("location.timeout_secs", "Timeout must be greater than 0");
        } else if self.location.timeout_secs > 120 {
            result.add_warning(
                "location.timeout_secs",
                "Location timeout is unusually long (>120s)",
            );
        }

        self.validate_url(&self.location.geocode_url, "location.geocode_url", &mut result);
        self.validate_url(
            &self.location.ip_lookup_url,
            "location.ip_lookup_url",
            &mut result,
        );
        self.validate_url(&self.climate.archive_url, "climate.archive_url", &mut result);

        if self.climate.years == 0 {
            result.add_error("climate.years", "At least one year of history is required");
        } else if self.climate.years > MAX_CLIMATE_YEARS {
            result.add_error(
                "climate.years",
                format!(
                    "At most {} years of history are available",
                    MAX_CLIMATE_YEARS
                ),
            );
        } else if self.climate.years > 30 {
            result.add_warning("climate.years", "More than 30 years of history requested");
        }

        self.validate_climate_table(&mut result);

        result
    }

    fn validate_climate_table(&self, result: &mut ValidationResult) {
        let table = &self.climate.fallback_climate_table;
        let field = "climate.fallback_climate_table";

        for entry in table {
            if !(1..=12).contains(&entry.month) {
                result.add_error(field, format!("Invalid month: {}", entry.month));
            }
            if !entry.avg_min.is_finite() || !entry.avg_max.is_finite() {
                result.add_error(field, format!("Month {} has a non-finite average", entry.month));
            } else if entry.avg_min > entry.avg_max {
                result.add_warning(
                    field,
                    format!("Month {} has avg_min above avg_max", entry.month),
                );
            }
        }

        for month in 1..=12 {
            match table.iter().filter(|e| e.month == month).count() {
                0 => result.add_error(field, format!("Month {} is missing", month)),
                1 => {}
                _ => result.add_error(field, format!("Month {} appears more than once", month)),
            }
        }
    }

    fn validate_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
        field_name: &str,
        result: &mut ValidationResult,
    ) {
        if !(-90.0..=90.0).contains(&latitude) {
            result.add_error(field_name, format!("Latitude out of range: {}", latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            result.add_error(field_name, format!("Longitude out of range: {}", longitude));
        }
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)?;

        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("bandwissel");

        Ok(config_dir.join("config.toml"))
    }
}
