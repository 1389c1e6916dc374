use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Longest daily forecast any supported provider returns
pub const MAX_FORECAST_DAYS: usize = 16;

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city_name: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            city_name: None,
        }
    }

    pub fn with_city_name(mut self, name: impl Into<String>) -> Self {
        self.city_name = Some(name.into());
        self
    }

    /// City name if known, otherwise the coordinates
    pub fn display_name(&self) -> String {
        match &self.city_name {
            Some(name) => name.clone(),
            None => format!("{:.2}, {:.2}", self.latitude, self.longitude),
        }
    }
}

/// Minimum and maximum temperature (°C) for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub min_temp: f64,
    pub max_temp: f64,
}

impl DailyObservation {
    pub fn new(date: NaiveDate, min_temp: f64, max_temp: f64) -> Self {
        Self {
            date,
            min_temp,
            max_temp,
        }
    }

    /// Both temperatures are usable numbers
    pub fn is_complete(&self) -> bool {
        self.min_temp.is_finite() && self.max_temp.is_finite()
    }
}

/// Daily forecast: chronological, one entry per date, at most
/// [`MAX_FORECAST_DAYS`] entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    days: Vec<DailyObservation>,
}

impl Forecast {
    /// Normalize raw observations. Incomplete entries are dropped, the rest
    /// sorted by date; the first entry wins for duplicate dates.
    pub fn from_observations(observations: impl IntoIterator<Item = DailyObservation>) -> Self {
        let mut days: Vec<DailyObservation> = observations
            .into_iter()
            .filter(DailyObservation::is_complete)
            .collect();

        // Stable sort keeps provider order among equal dates
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);
        days.truncate(MAX_FORECAST_DAYS);

        Self { days }
    }

    pub fn days(&self) -> &[DailyObservation] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }
}

/// Average daily minimum and maximum (°C) for a calendar month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverage {
    pub avg_min: f64,
    pub avg_max: f64,
}

impl MonthlyAverage {
    pub fn new(avg_min: f64, avg_max: f64) -> Self {
        Self { avg_min, avg_max }
    }
}

/// Monthly averages for all twelve months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateTable {
    months: [MonthlyAverage; 12],
}

impl ClimateTable {
    /// `months[0]` is January
    pub fn new(months: [MonthlyAverage; 12]) -> Self {
        Self { months }
    }

    /// Build a table from `(month, avg_min, avg_max)` entries.
    ///
    /// Returns `None` unless every month 1-12 is present. Later entries for
    /// the same month replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, f64, f64)>) -> Option<Self> {
        let mut months: [Option<MonthlyAverage>; 12] = [None; 12];

        for (month, avg_min, avg_max) in entries {
            if (1..=12).contains(&month) {
                months[(month - 1) as usize] = Some(MonthlyAverage::new(avg_min, avg_max));
            }
        }

        let mut filled = [MonthlyAverage::new(0.0, 0.0); 12];
        for (slot, month) in filled.iter_mut().zip(months) {
            *slot = month?;
        }
        Some(Self::new(filled))
    }

    /// Averages for `month` (1-12)
    pub fn month(&self, month: u32) -> Option<&MonthlyAverage> {
        match month {
            1..=12 => self.months.get((month - 1) as usize),
            _ => None,
        }
    }

    /// `(month, average)` pairs, January first
    pub fn iter(&self) -> impl Iterator<Item = (u32, &MonthlyAverage)> {
        self.months.iter().zip(1u32..).map(|(avg, month)| (month, avg))
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Locatiebepaling is geweigerd. Sta locatietoegang toe en probeer opnieuw."
            }
            Self::ServiceUnavailable | Self::Timeout | Self::Other(_) => {
                "Kon de locatie niet ophalen. Zorg ervoor dat locatiebepaling is ingeschakeld en probeer opnieuw."
            }
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Provider unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
    #[error("Provider rejected request: {status} - {message}")]
    Rejected { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "De weerdienst is niet bereikbaar. Controleer je internetverbinding.",
            Self::Rejected { status: 401, .. } => "De API-sleutel voor de weerdienst is ongeldig.",
            Self::Rejected { status: 404, .. } => {
                "Locatie niet gevonden. Controleer of je locatie correct is ingesteld."
            }
            Self::Rejected { status, .. } if *status >= 500 => {
                "De weerdienst heeft storing. Probeer het later opnieuw."
            }
            Self::Rejected { .. } => "De weerdienst weigerde het verzoek.",
            Self::Malformed(_) => "De weerdienst gaf een onverwacht antwoord.",
            Self::Location(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_forecast_sorts_and_dedups() {
        let forecast = Forecast::from_observations(vec![
            DailyObservation::new(date(2026, 10, 19), 5.0, 11.0),
            DailyObservation::new(date(2026, 10, 17), 6.0, 12.0),
            DailyObservation::new(date(2026, 10, 19), 1.0, 2.0),
            DailyObservation::new(date(2026, 10, 18), 4.0, 10.0),
        ]);

        let dates: Vec<_> = forecast.days().iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(2026, 10, 17), date(2026, 10, 18), date(2026, 10, 19)]);
        // First entry for a duplicated date is kept
        assert_eq!(forecast.days()[2].min_temp, 5.0);
    }

    #[test]
    fn test_forecast_drops_incomplete_entries() {
        let forecast = Forecast::from_observations(vec![
            DailyObservation::new(date(2026, 10, 17), f64::NAN, 12.0),
            DailyObservation::new(date(2026, 10, 18), 4.0, f64::INFINITY),
            DailyObservation::new(date(2026, 10, 19), 4.0, 9.0),
        ]);

        assert_eq!(forecast.len(), 1);
        assert_eq!(forecast.first_date(), Some(date(2026, 10, 19)));
    }

    #[test]
    fn test_forecast_truncates_to_horizon() {
        let start = date(2026, 10, 1);
        let forecast = Forecast::from_observations(
            (0..30).map(|i| DailyObservation::new(start + chrono::Days::new(i), 3.0, 8.0)),
        );

        assert_eq!(forecast.len(), MAX_FORECAST_DAYS);
        assert_eq!(forecast.last_date(), Some(date(2026, 10, 16)));
    }

    #[test]
    fn test_climate_table_requires_all_months() {
        let partial = ClimateTable::from_entries((1..=11).map(|m| (m, 1.0, 5.0)));
        assert!(partial.is_none());

        let full = ClimateTable::from_entries((1..=12).map(|m| (m, m as f64, 10.0 + m as f64)))
            .unwrap();
        assert_eq!(full.month(1), Some(&MonthlyAverage::new(1.0, 11.0)));
        assert_eq!(full.month(12), Some(&MonthlyAverage::new(12.0, 22.0)));
        assert_eq!(full.month(0), None);
        assert_eq!(full.month(13), None);
        assert_eq!(full.iter().count(), 12);
    }

    #[test]
    fn test_climate_table_ignores_out_of_range_months() {
        let table = ClimateTable::from_entries(
            (1..=12).map(|m| (m, 0.0, 1.0)).chain([(13, 99.0, 99.0)]),
        )
        .unwrap();
        assert!(table.iter().all(|(_, avg)| avg.avg_min == 0.0));
    }

    #[test]
    fn test_location_display_name() {
        let loc = Location::new(52.0907, 5.1214);
        assert_eq!(loc.display_name(), "52.09, 5.12");
        assert_eq!(loc.with_city_name("Utrecht").display_name(), "Utrecht");
    }

    #[test]
    fn test_location_serializes_only_known_fields() {
        let json = serde_json::to_value(Location::new(52.0907, 5.1214).with_city_name("Utrecht")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "latitude": 52.0907, "longitude": 5.1214, "city_name": "Utrecht" })
        );
    }

    #[test]
    fn test_rejected_user_messages() {
        let not_found = WeatherError::Rejected {
            status: 404,
            message: "city not found".into(),
        };
        assert!(not_found.user_message().contains("Locatie niet gevonden"));

        let server = WeatherError::Rejected {
            status: 503,
            message: String::new(),
        };
        assert!(server.user_message().contains("storing"));
    }

    #[test]
    fn test_location_error_wraps_into_weather_error() {
        let err: WeatherError = LocationError::PermissionDenied.into();
        assert!(matches!(err, WeatherError::Location(LocationError::PermissionDenied)));
        assert!(err.user_message().contains("geweigerd"));
    }
}
