//! Threshold-run scanning over a daily forecast.

use bandwissel_weather::DailyObservation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which side of the threshold qualifies a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Daily minimum strictly below the threshold
    Below,
    /// Daily maximum strictly above the threshold
    Above,
}

impl Direction {
    /// The temperature of `day` this direction compares
    pub fn reading(self, day: &DailyObservation) -> f64 {
        match self {
            Self::Below => day.min_temp,
            Self::Above => day.max_temp,
        }
    }

    /// Strict comparison; a value equal to the threshold never qualifies.
    pub fn crosses(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Below => value < threshold,
            Self::Above => value > threshold,
        }
    }
}

/// Find the first run of `run_length` consecutive qualifying days and return
/// the date the run started.
///
/// Days whose compared temperature is not finite are skipped without
/// breaking the run. A run still in progress when the days run out does not
/// count. A `run_length` of 0 is treated as 1.
pub fn scan(
    days: &[DailyObservation],
    threshold: f64,
    direction: Direction,
    run_length: usize,
) -> Option<NaiveDate> {
    let required = run_length.max(1);
    let mut run = 0usize;
    let mut run_start = None;

    for day in days {
        let value = direction.reading(day);
        if !value.is_finite() {
            continue;
        }

        if direction.crosses(value, threshold) {
            if run == 0 {
                run_start = Some(day.date);
            }
            run += 1;
            if run == required {
                return run_start;
            }
        } else {
            run = 0;
        }
    }

    None
}
