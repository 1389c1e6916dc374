//! Historical monthly averages.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use reqwest::Client;

use crate::provider::{open_meteo_observations, read_json, OpenMeteoResponse};
use crate::types::{ClimateTable, DailyObservation, Location, MonthlyAverage, WeatherError};

pub const OPEN_METEO_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Something that returns average min/max temperatures per month.
pub trait ClimateSource: Send + Sync {
    fn monthly_averages(
        &self,
        location: &Location,
        today: NaiveDate,
    ) -> impl Future<Output = Result<ClimateTable, WeatherError>> + Send;
}

/// A fixed table, independent of location.
#[derive(Debug, Clone)]
pub struct StaticClimate(pub ClimateTable);

impl ClimateSource for StaticClimate {
    async fn monthly_averages(
        &self,
        _location: &Location,
        _today: NaiveDate,
    ) -> Result<ClimateTable, WeatherError> {
        Ok(self.0.clone())
    }
}

/// Averages the last `years` complete calendar years from the Open-Meteo
/// historical archive. Months the archive has no data for are taken from
/// `fill`.
#[derive(Debug, Clone)]
pub struct ArchiveClimateClient {
    client: Arc<Client>,
    base_url: String,
    years: u32,
    fill: ClimateTable,
}

impl ArchiveClimateClient {
    pub fn new(
        base_url: impl Into<String>,
        years: u32,
        fill: ClimateTable,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            years: years.max(1),
            fill,
        })
    }

    /// First and last day of the averaged period; `None` when it would
    /// start before the calendar can represent.
    pub fn period(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let span = i32::try_from(self.years).ok()?.checked_sub(1)?;
        let last_year = today.year().checked_sub(1)?;
        let first_year = last_year.checked_sub(span)?;
        Some((
            NaiveDate::from_ymd_opt(first_year, 1, 1)?,
            NaiveDate::from_ymd_opt(last_year, 12, 31)?,
        ))
    }
}

impl ClimateSource for ArchiveClimateClient {
    async fn monthly_averages(
        &self,
        location: &Location,
        today: NaiveDate,
    ) -> Result<ClimateTable, WeatherError> {
        let (start, end) = self
            .period(today)
            .ok_or_else(|| WeatherError::Malformed(format!("no archive period before {}", today)))?;

        let url = format!("{}/v1/archive", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("start_date", start.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
                ("daily", "temperature_2m_min,temperature_2m_max".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let body: OpenMeteoResponse = read_json(response).await?;
        let daily = body
            .daily
            .ok_or_else(|| WeatherError::Malformed("missing daily block".to_string()))?;

        let observations = open_meteo_observations(daily);
        tracing::info!(
            "Averaging {} archive days from {} to {}",
            observations.len(),
            start,
            end
        );
        Ok(monthly_averages(&observations, &self.fill))
    }
}

/// Climate source chosen at runtime from configuration
#[derive(Debug, Clone)]
pub enum AnyClimateSource {
    Archive(ArchiveClimateClient),
    Static(StaticClimate),
}

impl ClimateSource for AnyClimateSource {
    async fn monthly_averages(
        &self,
        location: &Location,
        today: NaiveDate,
    ) -> Result<ClimateTable, WeatherError> {
        match self {
            Self::Archive(source) => source.monthly_averages(location, today).await,
            Self::Static(source) => source.monthly_averages(location, today).await,
        }
    }
}

/// Average daily observations per calendar month. Months without any
/// observation keep the value from `fill`.
pub fn monthly_averages(observations: &[DailyObservation], fill: &ClimateTable) -> ClimateTable {
    let mut sums = [(0.0_f64, 0.0_f64, 0_u32); 12];

    for obs in observations.iter().filter(|o| o.is_complete()) {
        let slot = &mut sums[obs.date.month0() as usize];
        slot.0 += obs.min_temp;
        slot.1 += obs.max_temp;
        slot.2 += 1;
    }

    let mut months = [MonthlyAverage::new(0.0, 0.0); 12];
    for ((month, avg), (sum_min, sum_max, count)) in fill.iter().zip(sums) {
        months[(month - 1) as usize] = if count == 0 {
            tracing::debug!("No archive data for month {}, using fallback", month);
            *avg
        } else {
            MonthlyAverage::new(sum_min / f64::from(count), sum_max / f64::from(count))
        };
    }

    ClimateTable::new(months)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat_table(value: f64) -> ClimateTable {
        ClimateTable::new([MonthlyAverage::new(value, value); 12])
    }

    #[test]
    fn test_monthly_averages_groups_by_month() {
        let observations = vec![
            DailyObservation::new(date(2024, 1, 1), 0.0, 4.0),
            DailyObservation::new(date(2025, 1, 15), 2.0, 6.0),
            DailyObservation::new(date(2025, 7, 1), 14.0, 25.0),
        ];

        let table = monthly_averages(&observations, &flat_table(99.0));
        assert_eq!(table.month(1), Some(&MonthlyAverage::new(1.0, 5.0)));
        assert_eq!(table.month(7), Some(&MonthlyAverage::new(14.0, 25.0)));
        // No data for March
        assert_eq!(table.month(3), Some(&MonthlyAverage::new(99.0, 99.0)));
    }

    #[test]
    fn test_monthly_averages_skips_incomplete() {
        let observations = vec![
            DailyObservation::new(date(2025, 2, 1), f64::NAN, 4.0),
            DailyObservation::new(date(2025, 2, 2), 1.0, 3.0),
        ];

        let table = monthly_averages(&observations, &flat_table(0.0));
        assert_eq!(table.month(2), Some(&MonthlyAverage::new(1.0, 3.0)));
    }

    #[test]
    fn test_archive_period_covers_complete_years() {
        let client = ArchiveClimateClient::new(OPEN_METEO_ARCHIVE_URL, 3, flat_table(0.0)).unwrap();
        let (start, end) = client.period(date(2026, 10, 17)).unwrap();
        assert_eq!(start, date(2023, 1, 1));
        assert_eq!(end, date(2025, 12, 31));
    }

    #[test]
    fn test_archive_period_out_of_range_is_none() {
        let client =
            ArchiveClimateClient::new(OPEN_METEO_ARCHIVE_URL, 2_147_483_648, flat_table(0.0)).unwrap();
        assert_eq!(client.period(date(2026, 10, 17)), None);

        let client = ArchiveClimateClient::new(OPEN_METEO_ARCHIVE_URL, u32::MAX, flat_table(0.0)).unwrap();
        assert_eq!(client.period(date(2026, 10, 17)), None);
    }

    #[tokio::test]
    async fn test_archive_period_out_of_range_is_malformed() {
        let client =
            ArchiveClimateClient::new("http://127.0.0.1:9", 2_147_483_648, flat_table(0.0)).unwrap();
        let err = client
            .monthly_averages(&Location::new(52.09, 5.12), date(2026, 10, 17))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_static_climate_returns_table() {
        let source = StaticClimate(flat_table(4.0));
        let table = source
            .monthly_averages(&Location::new(0.0, 0.0), date(2026, 1, 1))
            .await
            .unwrap();
        assert_eq!(table, flat_table(4.0));
    }
}
