//! Historical fallback: pick a switch date from monthly averages when the
//! forecast has no qualifying run.

use bandwissel_weather::{ClimateTable, MonthlyAverage};
use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::scanner::Direction;

impl Direction {
    /// The monthly average this direction compares
    pub fn monthly_reading(self, average: &MonthlyAverage) -> f64 {
        match self {
            Self::Below => average.avg_min,
            Self::Above => average.avg_max,
        }
    }
}

/// Search at most one full year of months, starting with the month of
/// `today`, for the first month whose average crosses `threshold`.
///
/// The returned date is the first `weekday` on or after the 1st of that
/// month, in the year of `today` or the following year if the search wrapped
/// past December. The date may lie before `today` when the current month
/// qualifies.
pub fn select_month(
    table: &ClimateTable,
    today: NaiveDate,
    threshold: f64,
    direction: Direction,
    weekday: Weekday,
) -> Option<NaiveDate> {
    let start = today.month0();

    for offset in 0..12 {
        let month0 = (start + offset) % 12;
        let month = month0 + 1;

        let Some(average) = table.month(month) else {
            continue;
        };
        let value = direction.monthly_reading(average);
        if !value.is_finite() || !direction.crosses(value, threshold) {
            continue;
        }

        let year = if start + offset >= 12 {
            today.year() + 1
        } else {
            today.year()
        };

        tracing::debug!("Month {} of {} qualifies ({:.1} °C)", month, year, value);
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        return first_weekday_on_or_after(first, weekday);
    }

    None
}

/// `date` itself if it falls on `weekday`, otherwise the next such day
pub fn first_weekday_on_or_after(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let current = date.weekday().num_days_from_monday();
    let target = weekday.num_days_from_monday();
    let ahead = (target + 7 - current) % 7;
    date.checked_add_days(Days::new(u64::from(ahead)))
}
