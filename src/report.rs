//! Min/max reductions and grouped summaries over forecasts and history.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use crate::core::{ForecastTable, Series};
use crate::error::{ForecastError, Result};

/// Weekday display names, Monday first, matching the weekday feature index.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Position and value of one extremum within a slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extreme {
    pub index: usize,
    pub value: f64,
}

/// Highest and lowest defined values of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakLow {
    pub peak: Extreme,
    pub low: Extreme,
}

/// Min/max reduction with first-occurrence tie-break: a later value must be
/// strictly greater (or strictly smaller) to displace the current extremum.
/// NaN values are skipped; `None` when no value is defined.
pub fn peak_low(values: &[f64]) -> Option<PeakLow> {
    let mut result: Option<PeakLow> = None;
    for (index, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match result.as_mut() {
            None => {
                let extreme = Extreme { index, value };
                result = Some(PeakLow {
                    peak: extreme,
                    low: extreme,
                });
            }
            Some(current) => {
                if value > current.peak.value {
                    current.peak = Extreme { index, value };
                }
                if value < current.low.value {
                    current.low = Extreme { index, value };
                }
            }
        }
    }
    result
}

/// A forecast extremum resolved to its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtremePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Peak and low points of one forecast target.
///
/// The low doubles as the "best time to consume" recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary {
    pub target: String,
    pub peak: ExtremePoint,
    pub low: ExtremePoint,
}

/// Summarise one target of a forecast table. Errors on an unknown target or
/// an empty forecast.
pub fn summarize_forecast(table: &ForecastTable, target: &str) -> Result<ForecastSummary> {
    let values = table.series(target)?;
    let extremes = peak_low(&values).ok_or(ForecastError::EmptyData)?;
    let timestamps = table.timestamps();
    Ok(ForecastSummary {
        target: target.to_string(),
        peak: ExtremePoint {
            timestamp: timestamps[extremes.peak.index],
            value: extremes.peak.value,
        },
        low: ExtremePoint {
            timestamp: timestamps[extremes.low.index],
            value: extremes.low.value,
        },
    })
}

/// Average value per weekday, Monday through Sunday.
///
/// Weekdays with no defined observations stay `None`; averages never divide
/// by an empty group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayProfile {
    pub averages: [Option<f64>; 7],
}

impl WeekdayProfile {
    /// Group a daily series column by weekday and average each group.
    pub fn from_daily(series: &Series, label: &str) -> Result<Self> {
        let column = series.column(label)?;
        let mut sums = [0.0; 7];
        let mut counts = [0usize; 7];

        for (timestamp, &value) in series.timestamps().iter().zip(column) {
            if value.is_nan() {
                continue;
            }
            let day = timestamp.weekday().num_days_from_monday() as usize;
            sums[day] += value;
            counts[day] += 1;
        }

        let mut averages = [None; 7];
        for day in 0..7 {
            if counts[day] > 0 {
                averages[day] = Some(sums[day] / counts[day] as f64);
            }
        }
        Ok(Self { averages })
    }

    /// Weekday with the highest average, first occurrence on ties.
    pub fn peak_day(&self) -> Option<(&'static str, f64)> {
        self.extreme(|candidate, best| candidate > best)
    }

    /// Weekday with the lowest average, first occurrence on ties.
    pub fn low_day(&self) -> Option<(&'static str, f64)> {
        self.extreme(|candidate, best| candidate < best)
    }

    fn extreme(&self, wins: impl Fn(f64, f64) -> bool) -> Option<(&'static str, f64)> {
        let mut result: Option<(usize, f64)> = None;
        for (day, average) in self.averages.iter().enumerate() {
            let Some(value) = *average else { continue };
            match result {
                None => result = Some((day, value)),
                Some((_, best)) if wins(value, best) => result = Some((day, value)),
                Some(_) => {}
            }
        }
        result.map(|(day, value)| (WEEKDAY_NAMES[day], value))
    }
}

/// Average value per hour of day, 0 through 23, from an hourly series.
///
/// Doubles as a one-day projected forecast: the profile at hour `h` is the
/// expected value at hour `h` of the next day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyProfile {
    pub averages: [Option<f64>; 24],
}

impl HourlyProfile {
    pub fn from_hourly(series: &Series, label: &str) -> Result<Self> {
        let column = series.column(label)?;
        let mut sums = [0.0; 24];
        let mut counts = [0usize; 24];

        for (timestamp, &value) in series.timestamps().iter().zip(column) {
            if value.is_nan() {
                continue;
            }
            let hour = timestamp.hour() as usize;
            sums[hour] += value;
            counts[hour] += 1;
        }

        let mut averages = [None; 24];
        for hour in 0..24 {
            if counts[hour] > 0 {
                averages[hour] = Some(sums[hour] / counts[hour] as f64);
            }
        }
        Ok(Self { averages })
    }

    /// Hour with the highest average, first occurrence on ties.
    pub fn peak_hour(&self) -> Option<(u32, f64)> {
        self.extreme(|candidate, best| candidate > best)
    }

    /// Hour with the lowest average, first occurrence on ties.
    pub fn low_hour(&self) -> Option<(u32, f64)> {
        self.extreme(|candidate, best| candidate < best)
    }

    fn extreme(&self, wins: impl Fn(f64, f64) -> bool) -> Option<(u32, f64)> {
        let mut result: Option<(u32, f64)> = None;
        for (hour, average) in self.averages.iter().enumerate() {
            let Some(value) = *average else { continue };
            match result {
                None => result = Some((hour as u32, value)),
                Some((_, best)) if wins(value, best) => result = Some((hour as u32, value)),
                Some(_) => {}
            }
        }
        result
    }
}
