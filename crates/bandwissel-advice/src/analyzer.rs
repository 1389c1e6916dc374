//! Season recommendations from a forecast and, when needed, monthly climate
//! averages.

use bandwissel_core::AnalysisConfig;
use bandwissel_weather::{ClimateTable, Forecast};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::fallback::select_month;
use crate::scanner::{scan, Direction};

pub const DEFAULT_THRESHOLD_CELSIUS: f64 = 7.0;
pub const DEFAULT_CONSECUTIVE_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Summer,
}

impl Season {
    /// Winter tires when it gets cold, summer tires when it warms up
    pub fn direction(self) -> Direction {
        match self {
            Self::Winter => Direction::Below,
            Self::Summer => Direction::Above,
        }
    }

    /// Dutch name of the tire type
    pub fn tires(self) -> &'static str {
        match self {
            Self::Winter => "winterbanden",
            Self::Summer => "zomerbanden",
        }
    }
}

/// Where a recommendation's date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    Forecast,
    Historical,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub season: Season,
    /// Present exactly when `basis` is not [`Basis::None`]
    pub effective_date: Option<NaiveDate>,
    pub basis: Basis,
}

impl Recommendation {
    pub fn none(season: Season) -> Self {
        Self {
            season,
            effective_date: None,
            basis: Basis::None,
        }
    }
}

/// Independent recommendations for both seasons. Both may carry a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub winter: Recommendation,
    pub summer: Recommendation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analyzer {
    pub threshold_celsius: f64,
    pub consecutive_days_required: usize,
    /// Weekday historical switch dates are moved to
    pub switch_weekday: Weekday,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            threshold_celsius: DEFAULT_THRESHOLD_CELSIUS,
            consecutive_days_required: DEFAULT_CONSECUTIVE_DAYS,
            switch_weekday: Weekday::Mon,
        }
    }
}

impl Analyzer {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            threshold_celsius: config.threshold_celsius,
            consecutive_days_required: config.consecutive_days_required as usize,
            ..Self::default()
        }
    }

    /// Recommendation for one season from the forecast alone; `None` when
    /// the forecast has no qualifying run.
    pub fn from_forecast(&self, season: Season, forecast: &Forecast) -> Option<Recommendation> {
        scan(
            forecast.days(),
            self.threshold_celsius,
            season.direction(),
            self.consecutive_days_required,
        )
        .map(|date| Recommendation {
            season,
            effective_date: Some(date),
            basis: Basis::Forecast,
        })
    }

    /// Forecast first, then monthly averages, otherwise no recommendation.
    pub fn recommend(
        &self,
        season: Season,
        forecast: &Forecast,
        climate: Option<&ClimateTable>,
        today: NaiveDate,
    ) -> Recommendation {
        if let Some(rec) = self.from_forecast(season, forecast) {
            return rec;
        }

        let historical = climate.and_then(|table| {
            select_month(
                table,
                today,
                self.threshold_celsius,
                season.direction(),
                self.switch_weekday,
            )
        });

        match historical {
            Some(date) => Recommendation {
                season,
                effective_date: Some(date),
                basis: Basis::Historical,
            },
            None => Recommendation::none(season),
        }
    }

    pub fn advise(
        &self,
        forecast: &Forecast,
        climate: Option<&ClimateTable>,
        today: NaiveDate,
    ) -> Advice {
        Advice {
            winter: self.recommend(Season::Winter, forecast, climate, today),
            summer: self.recommend(Season::Summer, forecast, climate, today),
        }
    }

    /// Whether either season has to fall back to monthly averages
    pub fn needs_climate(&self, forecast: &Forecast) -> bool {
        [Season::Winter, Season::Summer]
            .into_iter()
            .any(|season| self.from_forecast(season, forecast).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandwissel_weather::{DailyObservation, MonthlyAverage};
    use chrono::Days;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn forecast(start: NaiveDate, temps: &[(f64, f64)]) -> Forecast {
        Forecast::from_observations(temps.iter().enumerate().map(|(i, &(min, max))| {
            DailyObservation::new(start + Days::new(i as u64), min, max)
        }))
    }

    fn de_bilt() -> ClimateTable {
        ClimateTable::from_entries([
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
        ])
        .unwrap()
    }

    fn analyzer(days: usize) -> Analyzer {
        Analyzer {
            consecutive_days_required: days,
            ..Analyzer::default()
        }
    }

    #[test]
    fn test_empty_forecast_uses_historical() {
        let today = date(2026, 10, 17);
        let advice = analyzer(7).advise(&Forecast::default(), Some(&de_bilt()), today);

        assert_eq!(advice.winter.basis, Basis::Historical);
        assert_eq!(advice.summer.basis, Basis::Historical);
        // November is the first month with avg_min below 7; 2026-11-02 is a Monday
        assert_eq!(advice.winter.effective_date, Some(date(2026, 11, 2)));
        // October's avg_max of 15.0 is already above 7
        assert_eq!(advice.summer.effective_date, Some(date(2026, 10, 5)));
    }

    #[test]
    fn test_forecast_run_wins_over_climate() {
        let today = date(2026, 10, 17);
        let mut temps = vec![(9.0, 14.0); 3];
        temps.extend(std::iter::repeat((4.0, 6.5)).take(7));
        let advice = analyzer(7).advise(&forecast(today, &temps), Some(&de_bilt()), today);

        assert_eq!(advice.winter.basis, Basis::Forecast);
        assert_eq!(advice.winter.effective_date, Some(date(2026, 10, 20)));
        // No seven warm days in a row, summer comes from the climate table
        assert_eq!(advice.summer.basis, Basis::Historical);
    }

    #[test]
    fn test_both_seasons_can_come_from_forecast() {
        // Cold nights, warm afternoons
        let today = date(2026, 4, 1);
        let fc = forecast(today, &[(2.0, 12.0); 7]);
        let advice = analyzer(7).advise(&fc, None, today);

        assert_eq!(advice.winter.basis, Basis::Forecast);
        assert_eq!(advice.summer.basis, Basis::Forecast);
        assert_eq!(advice.winter.effective_date, Some(today));
        assert_eq!(advice.summer.effective_date, Some(today));
        assert!(!analyzer(7).needs_climate(&fc));
    }

    #[test]
    fn test_no_climate_and_no_run_is_none() {
        let today = date(2026, 10, 17);
        let rec = analyzer(7).recommend(Season::Winter, &Forecast::default(), None, today);
        assert_eq!(rec, Recommendation::none(Season::Winter));
    }

    #[test]
    fn test_climate_never_qualifying_is_none() {
        let table = ClimateTable::new([MonthlyAverage::new(10.0, 15.0); 12]);
        let rec = analyzer(7).recommend(Season::Winter, &Forecast::default(), Some(&table), date(2026, 1, 1));
        assert_eq!(rec.basis, Basis::None);
        assert_eq!(rec.effective_date, None);
    }

    #[test]
    fn test_needs_climate() {
        let today = date(2026, 10, 17);
        assert!(analyzer(7).needs_climate(&Forecast::default()));
        assert!(analyzer(3).needs_climate(&forecast(today, &[(2.0, 5.0); 3])));
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let today = date(2026, 12, 1);
        let fc = forecast(today, &[(1.0, 4.0), (8.0, 9.0), (1.0, 3.0)]);
        let a = analyzer(2).advise(&fc, Some(&de_bilt()), today);
        let b = analyzer(2).advise(&fc, Some(&de_bilt()), today);
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_config() {
        let config = AnalysisConfig {
            threshold_celsius: 5.0,
            consecutive_days_required: 3,
        };
        let analyzer = Analyzer::from_config(&config);
        assert_eq!(analyzer.threshold_celsius, 5.0);
        assert_eq!(analyzer.consecutive_days_required, 3);
        assert_eq!(analyzer.switch_weekday, Weekday::Mon);
    }
}
