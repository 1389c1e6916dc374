pub mod config;
pub mod error;

pub use config::{
    AnalysisConfig, ClimateConfig, ClimateSourceKind, Config, FallbackLocation, FetchFailurePolicy,
    FixedCoordinates, ForecastBackend, ForecastConfig, LocationConfig, MonthlyNormal,
    PositionSourceKind, ValidationResult,
};
pub use error::ConfigError;

use anyhow::Result;

/// Initialize logging for the advisor
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("Bandwissel core initialized");
    Ok(())
}
