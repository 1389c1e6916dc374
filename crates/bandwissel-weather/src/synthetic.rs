//! Deterministic stand-in forecast built from monthly averages, used when
//! the forecast provider cannot be reached.

use chrono::{Datelike, Days, NaiveDate};

use crate::types::{ClimateTable, DailyObservation, Forecast, MAX_FORECAST_DAYS};

/// Build `days` daily observations starting at `start`.
///
/// Each day's values are interpolated linearly between the averages of its
/// month and those of the following month, by how far into the month the
/// day falls.
pub fn synthetic_forecast(table: &ClimateTable, start: NaiveDate, days: usize) -> Forecast {
    let days = days.min(MAX_FORECAST_DAYS);

    Forecast::from_observations((0..days as u64).filter_map(|offset| {
        let date = start.checked_add_days(Days::new(offset))?;
        let (min_temp, max_temp) = interpolate(table, date)?;
        Some(DailyObservation::new(date, min_temp, max_temp))
    }))
}

fn interpolate(table: &ClimateTable, date: NaiveDate) -> Option<(f64, f64)> {
    let month = date.month();
    let next_month = month % 12 + 1;
    let current = table.month(month)?;
    let next = table.month(next_month)?;

    let fraction = f64::from(date.day0()) / f64::from(days_in_month(date)?);
    let lerp = |a: f64, b: f64| a + (b - a) * fraction;

    Some((
        lerp(current.avg_min, next.avg_min),
        lerp(current.avg_max, next.avg_max),
    ))
}

fn days_in_month(date: NaiveDate) -> Option<u32> {
    let first = date.with_day(1)?;
    let next_first = first.checked_add_months(chrono::Months::new(1))?;
    u32::try_from(next_first.signed_duration_since(first).num_days()).ok()
}
